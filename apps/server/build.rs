use std::env::vars;

use dotenvy::dotenv;

fn main() {
    dotenv().ok();

    for (key, value) in vars() {
        println!("cargo:rustc-env={key}={value}");
    }
}
