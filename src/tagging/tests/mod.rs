//! Unit and behaviour tests for tag annotation.

mod annotation_tests;
