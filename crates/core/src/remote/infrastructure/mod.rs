pub mod openai_vision_client;
