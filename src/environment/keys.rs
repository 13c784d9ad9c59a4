//! Well-known key codes of the environment table.

use std::fmt;

/// Keys the application reads from the environment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentKey {
    /// Project identifier, signed into every response.
    ProjectId,
    /// Service version, signed into every response.
    Version,
    /// HMAC secret for response signatures.
    Secret,
    MasterSheetId,
    UsersSheetName,
    CategorySheetName,
    WhiteListSheetName,
    GoogleApiUserInfoUrl,
    /// Override for the IPv4 proxy range feed URL.
    CloudflareIpListV4,
    /// Override for the IPv6 proxy range feed URL.
    CloudflareIpListV6,
}

impl EnvironmentKey {
    pub const ALL: [EnvironmentKey; 10] = [
        EnvironmentKey::ProjectId,
        EnvironmentKey::Version,
        EnvironmentKey::Secret,
        EnvironmentKey::MasterSheetId,
        EnvironmentKey::UsersSheetName,
        EnvironmentKey::CategorySheetName,
        EnvironmentKey::WhiteListSheetName,
        EnvironmentKey::GoogleApiUserInfoUrl,
        EnvironmentKey::CloudflareIpListV4,
        EnvironmentKey::CloudflareIpListV6,
    ];

    /// Row key in the environment table.
    pub const fn code(self) -> &'static str {
        match self {
            EnvironmentKey::ProjectId => "10000001",
            EnvironmentKey::Version => "10000002",
            EnvironmentKey::Secret => "10000003",
            EnvironmentKey::MasterSheetId => "10000004",
            EnvironmentKey::UsersSheetName => "10000005",
            EnvironmentKey::CategorySheetName => "10000006",
            EnvironmentKey::WhiteListSheetName => "10000007",
            EnvironmentKey::GoogleApiUserInfoUrl => "10000008",
            EnvironmentKey::CloudflareIpListV4 => "10000009",
            // Nine digits; existing deployments store it this way.
            EnvironmentKey::CloudflareIpListV6 => "100000010",
        }
    }

    /// Symbolic name, e.g. `PROJECT_ID`.
    pub const fn name(self) -> &'static str {
        match self {
            EnvironmentKey::ProjectId => "PROJECT_ID",
            EnvironmentKey::Version => "VERSION",
            EnvironmentKey::Secret => "SECRET",
            EnvironmentKey::MasterSheetId => "MASTER_SHEET_ID",
            EnvironmentKey::UsersSheetName => "USERS_SHEET_NAME",
            EnvironmentKey::CategorySheetName => "CATEGORY_SHEET_NAME",
            EnvironmentKey::WhiteListSheetName => "WHITE_LIST_SHEET_NAME",
            EnvironmentKey::GoogleApiUserInfoUrl => "GOOGLE_API_USER_INFO_URL",
            EnvironmentKey::CloudflareIpListV4 => "CLOUD_FLARE_IP_LIST_IPV4",
            EnvironmentKey::CloudflareIpListV6 => "CLOUD_FLARE_IP_LIST_IPV6",
        }
    }

    /// Look up a key by its symbolic name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Look up a key by its row key.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// Values that must never leave the process.
    pub fn is_sensitive(self) -> bool {
        matches!(self, EnvironmentKey::Secret)
    }
}

impl fmt::Display for EnvironmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_unique() {
        let mut codes: Vec<_> = EnvironmentKey::ALL.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), EnvironmentKey::ALL.len());
    }

    #[test]
    fn name_lookup() {
        assert_eq!(EnvironmentKey::from_name("SECRET"), Some(EnvironmentKey::Secret));
        assert_eq!(EnvironmentKey::from_name("secret"), None);
        assert_eq!(EnvironmentKey::from_name("NOPE"), None);
    }

    #[test]
    fn code_lookup() {
        assert_eq!(EnvironmentKey::from_code("10000001"), Some(EnvironmentKey::ProjectId));
        assert_eq!(
            EnvironmentKey::from_code("100000010"),
            Some(EnvironmentKey::CloudflareIpListV6)
        );
        assert_eq!(EnvironmentKey::from_code("10000010"), None);
    }
}
