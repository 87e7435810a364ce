/// Where the refresh endpoint lives, relative to the server's base URL. The
/// refresh token goes in the `Authorization` header as-is, without a
/// `Bearer` scheme.
pub const PATH: &str = "refresh";
