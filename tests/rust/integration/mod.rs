mod config_tests;
mod querier_tests;
