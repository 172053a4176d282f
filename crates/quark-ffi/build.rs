use std::path::Path;

fn main() {
    println!("cargo:rerun-if-changed=src");
    println!("cargo:rerun-if-changed=cbindgen.toml");

    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let crate_dir = Path::new(&manifest_dir);
    let config = cbindgen::Config::from_file(crate_dir.join("cbindgen.toml")).expect("cbindgen.toml parses");

    let header = crate_dir.join("include").join("quark.h");
    if let Some(dir) = header.parent() {
        std::fs::create_dir_all(dir).expect("include/ is writable");
    }

    match cbindgen::generate_with_config(crate_dir, config) {
        Ok(bindings) => {
            bindings.write_to_file(&header);
        }
        // rustc reports the syntax error itself.
        Err(cbindgen::Error::ParseSyntaxError { .. }) => {
            println!("cargo:warning=quark.h not regenerated: crate does not parse");
        }
        Err(err) => panic!("cbindgen: {err}"),
    }
}
