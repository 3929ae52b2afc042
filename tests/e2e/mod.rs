pub mod windowing;
