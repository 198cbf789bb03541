//! Build script for proto compilation.
//!
//! The generated code is committed under `src/generated/`, so this only needs
//! to run when one of the `.proto` files changes.
//!
//! To regenerate: `cargo build --features regenerate-proto`
//!
//! Two passes are made: the host-facing provider protocol gets a server
//! stub, while the Common Fate control-plane protos only get message types.
//! Calls to the control plane go through the hand-written unary helper in
//! `src/client/grpc.rs`.

const PROVIDER_PROTO: &str = "proto/provider.proto";

const CONTROL_PLANE_PROTOS: &[&str] = &[
    "proto/commonfate/control/diagnostic/v1alpha1/diagnostic.proto",
    "proto/commonfate/control/config/v1alpha1/config.proto",
    "proto/commonfate/control/integration/v1alpha1/integration.proto",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "regenerate-proto")]
    {
        let out_dir = std::path::PathBuf::from("src/generated");

        tonic_prost_build::configure()
            .out_dir(&out_dir)
            .build_client(false)
            .build_server(true)
            .compile_protos(&[PROVIDER_PROTO], &["proto"])?;

        tonic_prost_build::configure()
            .out_dir(&out_dir)
            .build_client(false)
            .build_server(false)
            .compile_protos(CONTROL_PLANE_PROTOS, &["proto"])?;
    }

    println!("cargo:rerun-if-changed={}", PROVIDER_PROTO);
    for proto in CONTROL_PLANE_PROTOS {
        println!("cargo:rerun-if-changed={}", proto);
    }

    Ok(())
}
