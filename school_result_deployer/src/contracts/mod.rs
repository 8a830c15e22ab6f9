pub mod school_result;
