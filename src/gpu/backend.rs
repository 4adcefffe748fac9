use ocl::enums::{DeviceInfo, DeviceInfoResult};
use ocl::DeviceType as OclDeviceType;
use ocl::{Buffer, Context, Device, Kernel, Platform, Program, Queue};
use std::fmt;
use tracing::{info, warn};

use super::constants::{COPY_KERNEL, CSA_INDIRECT_KERNEL, CSA_STRIDED_KERNEL, SHARED_MEM_KERNEL};
use super::device::{ComputeBackend, CsaKernelArgs, DeviceType, LaunchConfig};
use super::memory::{MemoryLedger, Reservation};
use crate::csa::DeviceAddressing;
use crate::error::{BenchError, Result};
use crate::types::{Real, REAL_CL_NAME};

/// GPU backend using OpenCL
///
/// Owns one in-order command queue, so launches enqueued back to back run in
/// program order without host-side barriers.
pub struct GpuBackend {
    pub queue: Queue,
    device: Device,
    device_type: DeviceType,
    pub program: Program,
    ledger: MemoryLedger,
}

/// OpenCL buffer plus its share of the device's global memory
pub struct GpuBuffer {
    buffer: Buffer<Real>,
    len: usize,
    _reservation: Reservation,
}

impl GpuBuffer {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// OpenCL kernel plus the index tables it reads, kept alive with it
pub struct GpuKernel {
    kernel: Kernel,
    _tables: Option<(Buffer<u32>, Buffer<u32>)>,
}

impl GpuBackend {
    /// Select device `device_id` (GPUs first, then CPU devices, in platform
    /// order) and build the benchmark kernels for it
    pub fn new(device_id: usize) -> Result<Self> {
        let devices = Self::list_devices()?;
        let (platform, device, device_type) = devices.get(device_id).copied().ok_or_else(|| {
            BenchError::DeviceInit(format!(
                "device {} not found ({} OpenCL device(s) available)",
                device_id,
                devices.len()
            ))
        })?;

        let context = Context::builder()
            .platform(platform)
            .devices(device)
            .build()
            .map_err(|e| BenchError::DeviceInit(format!("Failed to create context: {}", e)))?;

        let queue = Queue::new(&context, device, None)
            .map_err(|e| BenchError::DeviceInit(format!("Failed to create queue: {}", e)))?;

        let mut options = format!("-D REAL={}", REAL_CL_NAME);
        if cfg!(feature = "double") {
            options.push_str(" -D USE_DOUBLE");
        }
        let program = Program::builder()
            .source(include_str!("kernels.cl"))
            .devices(device)
            .cmplr_opt(options)
            .build(&context)
            .map_err(|e| BenchError::DeviceInit(format!("Failed to build program: {}", e)))?;

        let ledger = MemoryLedger::new(global_mem_size(&device)?);
        info!(
            device_id,
            device = ?device_type,
            global_memory_mb = ledger.capacity() / (1024 * 1024),
            "GPU backend initialized"
        );

        Ok(Self {
            queue,
            device,
            device_type,
            program,
            ledger,
        })
    }

    /// All OpenCL devices, GPUs before CPUs
    fn list_devices() -> Result<Vec<(Platform, Device, DeviceType)>> {
        // Handle platform list errors gracefully
        let platforms = match std::panic::catch_unwind(Platform::list) {
            Ok(platforms) => platforms,
            Err(_) => {
                return Err(BenchError::DeviceInit("OpenCL runtime not available".to_string()));
            }
        };

        if platforms.is_empty() {
            return Err(BenchError::DeviceInit(
                "No OpenCL platforms found. Please install OpenCL drivers for your GPU.".to_string(),
            ));
        }

        let mut gpus = Vec::new();
        let mut cpus = Vec::new();
        for platform in &platforms {
            let devices = Device::list_all(platform)
                .map_err(|e| BenchError::DeviceInit(format!("Failed to list devices: {}", e)))?;

            for device in devices {
                let kind = match device.info(DeviceInfo::Type) {
                    Ok(DeviceInfoResult::Type(kind)) => kind,
                    _ => continue,
                };
                if kind.contains(OclDeviceType::GPU) {
                    let vendor = device.vendor().map_err(|e| BenchError::DeviceInit(e.to_string()))?;
                    gpus.push((*platform, device, Self::classify(&vendor)));
                } else if kind.contains(OclDeviceType::CPU) {
                    cpus.push((*platform, device, DeviceType::Cpu));
                }
            }
        }

        if gpus.is_empty() && !cpus.is_empty() {
            warn!("No GPU found, only CPU OpenCL devices are available");
        }
        gpus.extend(cpus);
        Ok(gpus)
    }

    fn classify(vendor: &str) -> DeviceType {
        if vendor.contains("NVIDIA") {
            DeviceType::NvidiaGpu
        } else if vendor.contains("AMD") || vendor.contains("Advanced Micro Devices") {
            DeviceType::AmdGpu
        } else {
            DeviceType::IntelGpu
        }
    }

    /// Global memory size of the selected device
    pub fn global_memory(&self) -> u64 {
        self.ledger.capacity()
    }

    /// Bytes currently held by live buffers
    pub fn allocated_bytes(&self) -> u64 {
        self.ledger.in_use()
    }

    fn max_alloc_size(&self) -> Result<u64> {
        match self.device.info(DeviceInfo::MaxMemAllocSize).map_err(ocl_err)? {
            DeviceInfoResult::MaxMemAllocSize(size) => Ok(size),
            _ => Err(BenchError::Launch("Failed to get maximum allocation size".to_string())),
        }
    }

    fn index_table(&self, table: &[u32]) -> Result<Buffer<u32>> {
        Buffer::<u32>::builder()
            .queue(self.queue.clone())
            .flags(ocl::flags::MEM_READ_ONLY)
            .len(table.len())
            .copy_host_slice(table)
            .build()
            .map_err(ocl_err)
    }
}

fn global_mem_size(device: &Device) -> Result<u64> {
    match device.info(DeviceInfo::GlobalMemSize).map_err(ocl_err)? {
        DeviceInfoResult::GlobalMemSize(size) => Ok(size),
        _ => Err(BenchError::DeviceInit("Failed to get global memory size".to_string())),
    }
}

fn ocl_err<E: fmt::Display>(err: E) -> BenchError {
    BenchError::Launch(err.to_string())
}

impl ComputeBackend for GpuBackend {
    type Buffer = GpuBuffer;
    type Kernel = GpuKernel;

    fn device_type(&self) -> DeviceType {
        self.device_type
    }

    fn device_info(&self) -> Result<String> {
        let name = self.device.name().map_err(ocl_err)?;
        let vendor = self.device.vendor().map_err(ocl_err)?;
        let version = self.device.version().map_err(ocl_err)?;
        let max_compute_units = match self.device.info(DeviceInfo::MaxComputeUnits).map_err(ocl_err)? {
            DeviceInfoResult::MaxComputeUnits(units) => units,
            _ => return Err(BenchError::Launch("Failed to get max compute units".to_string())),
        };
        let max_work_group_size = self.device.max_wg_size().map_err(ocl_err)?;
        let global_mem_size = self.ledger.capacity();

        Ok(format!(
            "Device: {}\nVendor: {}\nVersion: {}\nCompute Units: {}\nMax Work Group Size: {}\nGlobal Memory: {} MB",
            name,
            vendor,
            version,
            max_compute_units,
            max_work_group_size,
            global_mem_size / (1024 * 1024)
        ))
    }

    fn lane_size(&self) -> usize {
        self.device_type.lane_size()
    }

    fn max_work_group_size(&self) -> usize {
        self.device.max_wg_size().unwrap_or(1)
    }

    fn allocate(&self, len: usize) -> Result<GpuBuffer> {
        let bytes = (len * std::mem::size_of::<Real>()) as u64;
        let max_alloc = self.max_alloc_size()?;
        if bytes > max_alloc {
            return Err(BenchError::resource_exhausted(
                bytes,
                format!("device allows at most {} bytes per allocation", max_alloc),
            ));
        }
        let reservation = self.ledger.reserve(bytes)?;

        let buffer = Buffer::<Real>::builder()
            .queue(self.queue.clone())
            .flags(ocl::flags::MEM_READ_WRITE)
            .len(len.max(1))
            .build()
            .map_err(|e| {
                BenchError::resource_exhausted(bytes, format!("Failed to allocate GPU buffer: {}", e))
            })?;
        Ok(GpuBuffer {
            buffer,
            len,
            _reservation: reservation,
        })
    }

    fn copy_to_device(&self, dst: &mut GpuBuffer, src: &[Real]) -> Result<()> {
        dst.buffer.write(src).enq().map_err(ocl_err)?;
        Ok(())
    }

    fn copy_to_host(&self, dst: &mut [Real], src: &GpuBuffer) -> Result<()> {
        src.buffer.read(dst).enq().map_err(ocl_err)?;
        Ok(())
    }

    fn csa_kernel(&self, args: &CsaKernelArgs, a: &GpuBuffer, b: &mut GpuBuffer) -> Result<GpuKernel> {
        let params = &args.params;
        let (a, b) = (&a.buffer, &mut b.buffer);
        match &args.addressing {
            DeviceAddressing::Strided {
                first_a,
                first_b,
                offset_a,
                offset_b,
            } => {
                let kernel = Kernel::builder()
                    .program(&self.program)
                    .name(CSA_STRIDED_KERNEL)
                    .queue(self.queue.clone())
                    .arg(params.m as i32)
                    .arg(params.n as i32)
                    .arg(params.alpha)
                    .arg(a)
                    .arg(params.lda as i32)
                    .arg(params.beta)
                    .arg(&*b)
                    .arg(params.ldb as i32)
                    .arg(*first_a as u64)
                    .arg(*first_b as u64)
                    .arg(*offset_a as u64)
                    .arg(*offset_b as u64)
                    .arg(args.num_elements as u64)
                    .build()
                    .map_err(|e| BenchError::Launch(format!("Failed to create csa kernel: {}", e)))?;
                Ok(GpuKernel { kernel, _tables: None })
            }
            DeviceAddressing::Indirect { bases_a, bases_b } => {
                let table_a = self.index_table(bases_a)?;
                let table_b = self.index_table(bases_b)?;
                let kernel = Kernel::builder()
                    .program(&self.program)
                    .name(CSA_INDIRECT_KERNEL)
                    .queue(self.queue.clone())
                    .arg(params.m as i32)
                    .arg(params.n as i32)
                    .arg(params.alpha)
                    .arg(a)
                    .arg(params.lda as i32)
                    .arg(params.beta)
                    .arg(&*b)
                    .arg(params.ldb as i32)
                    .arg(&table_a)
                    .arg(&table_b)
                    .arg(args.num_elements as u64)
                    .build()
                    .map_err(|e| BenchError::Launch(format!("Failed to create csa kernel: {}", e)))?;
                Ok(GpuKernel {
                    kernel,
                    _tables: Some((table_a, table_b)),
                })
            }
        }
    }

    fn copy_kernel(&self, to: &mut GpuBuffer, from: &GpuBuffer, len: usize) -> Result<GpuKernel> {
        let kernel = Kernel::builder()
            .program(&self.program)
            .name(COPY_KERNEL)
            .queue(self.queue.clone())
            .arg(&to.buffer)
            .arg(&from.buffer)
            .arg(len as u64)
            .build()
            .map_err(|e| BenchError::Launch(format!("Failed to create copy kernel: {}", e)))?;
        Ok(GpuKernel { kernel, _tables: None })
    }

    fn shared_mem_kernel(&self, scratch: &mut GpuBuffer, magic: Real, repeats: u32) -> Result<GpuKernel> {
        let kernel = Kernel::builder()
            .program(&self.program)
            .name(SHARED_MEM_KERNEL)
            .queue(self.queue.clone())
            .arg(&scratch.buffer)
            .arg(magic)
            .arg(repeats)
            .arg_local::<Real>(self.lane_size())
            .build()
            .map_err(|e| BenchError::Launch(format!("Failed to create shared-memory kernel: {}", e)))?;
        Ok(GpuKernel { kernel, _tables: None })
    }

    fn launch(&self, kernel: &GpuKernel, config: LaunchConfig) -> Result<()> {
        config.check(self.max_work_group_size())?;
        // Arguments were bound and sized when the kernel was built
        unsafe {
            kernel
                .kernel
                .cmd()
                .global_work_size(config.total_lanes())
                .local_work_size(config.block)
                .enq()
                .map_err(ocl_err)?;
        }
        Ok(())
    }

    fn synchronize(&self) -> Result<()> {
        self.queue.finish().map_err(ocl_err)?;
        Ok(())
    }

    fn finalize(self) -> Result<()> {
        self.queue.finish().map_err(ocl_err)?;
        info!(bytes_in_use = self.ledger.in_use(), "GPU backend finalized");
        Ok(())
    }
}

impl fmt::Display for GpuBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPU Backend ({:?})", self.device_type)
    }
}
