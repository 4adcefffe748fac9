#[cfg(test)]
mod property_tests {
    use csa_bench::csa::{batch_csa, par_batch_csa, single_csa, BatchMut, BatchRef, DeviceAddressing};
    use csa_bench::gpu::{ComputeBackend, CsaKernelArgs, DeviceBatch, LaunchConfig, MockGpuBackend};
    use csa_bench::matrix::CsaParams;
    use csa_bench::types::{Real, Transpose};
    use proptest::prelude::*;

    /// Shape, padding and batch size of one generated problem
    #[derive(Debug, Clone)]
    struct Case {
        m: usize,
        n: usize,
        lda: usize,
        ldb: usize,
        num_elements: usize,
        alpha: Real,
        beta: Real,
        a: Vec<Real>,
        b: Vec<Real>,
    }

    impl Case {
        fn params(&self) -> CsaParams {
            CsaParams::new(self.m, self.n, self.alpha, self.beta).with_lds(self.lda, self.ldb)
        }

        fn offset_a(&self) -> usize {
            self.lda * self.n.max(1)
        }

        fn offset_b(&self) -> usize {
            self.ldb * self.n.max(1)
        }

        /// `num_elements` independent single-pair runs
        fn reference(&self) -> Vec<Real> {
            let mut b = self.b.clone();
            for index in 0..self.num_elements {
                single_csa(
                    Transpose::NoTrans,
                    Transpose::NoTrans,
                    self.m,
                    self.n,
                    self.alpha,
                    &self.a[index * self.offset_a()..],
                    self.lda,
                    &mut b[index * self.offset_b()..],
                    self.ldb,
                    self.beta,
                );
            }
            b
        }
    }

    fn coefficient() -> impl Strategy<Value = Real> {
        prop_oneof![Just(0.0), Just(1.0), -4.0 as Real..4.0]
    }

    fn case_strategy() -> impl Strategy<Value = Case> {
        (0usize..6, 0usize..6, 0usize..3, 0usize..3, 1usize..8, coefficient(), coefficient()).prop_flat_map(
            |(m, n, pad_a, pad_b, num_elements, alpha, beta)| {
                let lda = m.max(1) + pad_a;
                let ldb = m.max(1) + pad_b;
                let len_a = lda * n.max(1) * num_elements;
                let len_b = ldb * n.max(1) * num_elements;
                (
                    prop::collection::vec(-100.0 as Real..100.0, len_a),
                    prop::collection::vec(-100.0 as Real..100.0, len_b),
                )
                    .prop_map(move |(a, b)| Case { m, n, lda, ldb, num_elements, alpha, beta, a, b })
            },
        )
    }

    proptest! {
        #[test]
        fn test_strided_matches_independent_runs(case in case_strategy()) {
            let mut b = case.b.clone();
            batch_csa(
                &case.params(),
                &BatchRef::strided(&case.a, case.offset_a()),
                &mut BatchMut::strided(&mut b, case.offset_b()),
                case.num_elements,
            );
            prop_assert_eq!(b, case.reference());
        }

        #[test]
        fn test_indirect_matches_strided(case in case_strategy()) {
            let mut strided = case.b.clone();
            batch_csa(
                &case.params(),
                &BatchRef::strided(&case.a, case.offset_a()),
                &mut BatchMut::strided(&mut strided, case.offset_b()),
                case.num_elements,
            );

            let mut indirect = case.b.clone();
            batch_csa(
                &case.params(),
                &BatchRef::indirect_from_chunks(&case.a, case.offset_a(), case.num_elements),
                &mut BatchMut::indirect_from_chunks(&mut indirect, case.offset_b(), case.num_elements),
                case.num_elements,
            );
            prop_assert_eq!(indirect, strided);
        }

        #[test]
        fn test_parallel_matches_sequential(case in case_strategy()) {
            let mut b = case.b.clone();
            par_batch_csa(
                &case.params(),
                &BatchRef::strided(&case.a, case.offset_a()),
                &mut BatchMut::strided(&mut b, case.offset_b()),
                case.num_elements,
            );
            prop_assert_eq!(b, case.reference());
        }

        #[test]
        fn test_mock_device_matches_reference(case in case_strategy(), block in 1usize..9) {
            let backend = MockGpuBackend::new(0).unwrap();
            let mut batch = DeviceBatch::upload(&backend, &case.a, &case.b).unwrap();
            let args = CsaKernelArgs {
                params: case.params(),
                addressing: DeviceAddressing::strided(case.offset_a(), case.offset_b()),
                num_elements: case.num_elements,
            };
            let kernel = backend.csa_kernel(&args, &batch.a, &mut batch.b).unwrap();
            backend.launch(&kernel, LaunchConfig::cover(case.num_elements, block).unwrap()).unwrap();
            backend.synchronize().unwrap();

            let mut b = vec![0.0; case.b.len()];
            batch.download_b(&backend, &mut b).unwrap();
            prop_assert_eq!(b, case.reference());
        }
    }
}
