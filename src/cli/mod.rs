mod args;

pub use args::{
    default_output_path, ensure_pdf_extension, has_pdf_extension, Args, Level, TargetFormat,
};
