/// Greeting service other modules can fetch from the service hub.
pub trait GreeterApi: Send + Sync {
    /// Greeting for `name`, e.g. `Hello, Ada!`.
    fn greet(&self, name: &str) -> String;

    /// Configured salutation.
    fn salutation(&self) -> &str;
}
