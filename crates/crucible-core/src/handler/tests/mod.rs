// Handler test module
#[cfg(test)]
mod handler_tests;
