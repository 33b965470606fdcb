#![allow(dead_code)]

#[cfg(test)]
extern crate pretty_assertions;

pub mod bios;
pub mod cpu;
pub mod gpu;
pub mod machine;
pub mod memory;
pub mod pic;
pub mod storage;
pub mod tools;
