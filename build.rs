fn main() {
    // Only configure OpenCL when gpu feature is enabled
    if std::env::var_os("CARGO_FEATURE_GPU").is_some() {
        // Extra search path for drivers installed outside the system linker path
        if let Some(dir) = std::env::var_os("OPENCL_LIB_DIR") {
            println!("cargo:rustc-link-search=native={}", dir.to_string_lossy());
        }
        println!("cargo:rustc-link-lib=OpenCL");
    }
    println!("cargo:rerun-if-env-changed=OPENCL_LIB_DIR");
    println!("cargo:rerun-if-changed=src/gpu/kernels.cl");
}
