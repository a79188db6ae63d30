extern crate bindgen;

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=wrapper.h");
    println!("cargo:rustc-link-lib=v4l2");

    let bindings = bindgen::Builder::default()
        .header("wrapper.h")
        .allowlist_type("v4l2_.*")
        .allowlist_var("V4L2_.*")
        .allowlist_function("v4l2_.*")
        .generate()
        .expect("Failed to generate bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").unwrap());
    bindings
        .write_to_file(out_path.join("libv4l_bindings.rs"))
        .expect("Failed to write bindings");
}
