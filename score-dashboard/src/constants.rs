pub(crate) const DEFAULT_PORT: u16 = 8080;
pub(crate) const DEFAULT_STATIC_DIR: &str = "./static";
