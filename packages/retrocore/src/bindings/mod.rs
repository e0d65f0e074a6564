//! Host-facing bindings. Only the `wasm` front-end exists today, gated
//! behind the `wasm` feature so a plain `cargo build` of the library
//! never pulls in `wasm-bindgen`/`js-sys`.

#[cfg(feature = "wasm")]
pub mod wasm;
