mod normalizer_properties;
mod parser_robustness_tests;
mod translation_tests;
