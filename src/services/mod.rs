pub mod result_mapper;

pub use result_mapper::{map_analysis_response, map_final_output, MappingError};
