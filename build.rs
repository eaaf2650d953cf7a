extern crate lalrpop;

/// this build script generates the parser (leo.rs in OUT_DIR) from leo.lalrpop
fn main() {
    lalrpop::Configuration::new()
        .use_cargo_dir_conventions()
        .process()
        .unwrap();
}
