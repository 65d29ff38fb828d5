pub mod gapfill_model;
