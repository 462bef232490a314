pub mod yaya;
