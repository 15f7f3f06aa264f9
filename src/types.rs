pub type Float = f64;
