pub mod flow_tests;
