mod cache_behavior_tests;
mod consistency_tests;
mod scenario_tests;
mod toolkit_tests;
