// Build script for auth-service
// Compiles auth_service.proto for the gRPC server and the client used in tests
fn main() {
    println!("cargo:rerun-if-changed=proto/auth_service.proto");

    // Prefer a system protoc; fall back to the vendored binary
    if std::env::var_os("PROTOC").is_none() {
        if let Ok(path) = protoc_bin_vendored::protoc_bin_path() {
            std::env::set_var("PROTOC", path);
        }
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(&["proto/auth_service.proto"], &["proto"])
        .expect("Failed to compile auth_service.proto");
}
