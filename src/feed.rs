const PACKAGING_SEGMENT: &str = "/_packaging/";
const LEGACY_HOST: &str = "pkgs.visualstudio.com/";
const HOSTED_HOST: &str = "pkgs.dev.azure.com/";

/// Whether `url` points at a hosted packaging feed.
///
/// The path must contain a `/_packaging/` segment and the host must be one of
/// the legacy (`pkgs.visualstudio.com`) or current (`pkgs.dev.azure.com`) feed hosts.
pub fn is_feed_url(url: &str) -> bool {
    if !url.contains(PACKAGING_SEGMENT) {
        return false;
    }
    url.contains(LEGACY_HOST) || url.contains(HOSTED_HOST)
}
