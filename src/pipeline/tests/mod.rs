//! Unit and behaviour tests for the application pipeline.

mod concurrency_tests;
