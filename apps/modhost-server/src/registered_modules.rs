// Links every module crate so its `register_module!` submission reaches the
// inventory. New modules must be added here and to Cargo.toml.
#![allow(unused_imports)]

use greeter as _;
use status as _;
