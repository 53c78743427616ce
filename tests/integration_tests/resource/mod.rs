mod model_tests;
mod resource_tests;
