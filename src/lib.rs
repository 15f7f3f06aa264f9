#![allow(non_snake_case)]

use types::Float;
pub extern crate nalgebra as na;

pub mod basis;
pub mod config;
pub mod contact;
pub mod cop;
pub mod diagnostics;
pub mod distributor;
pub mod error;
pub mod matrix;
pub mod optimizer;
pub mod reconstruct;
pub mod spatial;
pub mod types;
pub mod util;

pub const GRAVITY: Float = 9.81;

pub const PI: Float = std::f64::consts::PI;
