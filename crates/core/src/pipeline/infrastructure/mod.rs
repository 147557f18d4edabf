pub mod threaded_encode_executor;
