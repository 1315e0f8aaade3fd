//! Well-known credential keys.
//!
//! The controller credential issuer keeps its keypair and certificates in the
//! same preference namespace as everything else. Certificates are stored per
//! fabric: the key is a base prefix followed by the fabric id in lowercase
//! hex, so fabric 1 uses `AndroidCARootCert1`.

/// Key of the serialized issuer keypair.
pub const ISSUER_KEYPAIR_KEY: &str = "AndroidDeviceControllerKey";

/// Prefix of the per-fabric root certificate (RCAC) key.
pub const ROOT_CERTIFICATE_PREFIX: &str = "AndroidCARootCert";

/// Prefix of the per-fabric intermediate certificate (ICAC) key.
pub const INTERMEDIATE_CERTIFICATE_PREFIX: &str = "AndroidICAC";

/// Root certificate key for fabric 1.
pub const ROOT_CERTIFICATE_KEY: &str = "AndroidCARootCert1";

/// Intermediate certificate key for fabric 1.
pub const INTERMEDIATE_CERTIFICATE_KEY: &str = "AndroidICAC1";

/// Build a per-fabric key from a base prefix.
#[must_use]
pub fn fabric_scoped_key(prefix: &str, fabric_id: u64) -> String {
    format!("{prefix}{fabric_id:x}")
}

/// The three credential entries the adapter can check for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    IssuerKeypair,
    RootCertificate,
    IntermediateCertificate,
}

impl CredentialKey {
    /// All credential keys, in issuance order.
    pub const ALL: [Self; 3] = [
        Self::IssuerKeypair,
        Self::RootCertificate,
        Self::IntermediateCertificate,
    ];

    /// The storage key of this credential.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IssuerKeypair => ISSUER_KEYPAIR_KEY,
            Self::RootCertificate => ROOT_CERTIFICATE_KEY,
            Self::IntermediateCertificate => INTERMEDIATE_CERTIFICATE_KEY,
        }
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::IssuerKeypair => "issuer keypair",
            Self::RootCertificate => "root certificate (RCAC)",
            Self::IntermediateCertificate => "intermediate certificate (ICAC)",
        }
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
