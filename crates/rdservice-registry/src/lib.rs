//! The static catalog of known RD service providers.
//!
//! The catalog owns the package-to-action mapping. Actions are derived from
//! the cataloged modality and never taken from caller input: caller-supplied
//! action strings have historically mislabeled face providers with activity
//! class names instead of the UIDAI capture action.

#![warn(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::clone_on_ref_ptr
)]

use primitives_pid::Modality;
use rdservice_intent::actions;

/// One certified RD service provider known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provider {
    /// Stable catalog identifier.
    pub id: &'static str,
    /// Human-readable label for selector UIs.
    pub label: &'static str,
    /// Package identifier of the vendor application.
    pub package: &'static str,
    /// The modality the provider captures.
    pub modality: Modality,
}

impl Provider {
    /// The UIDAI capture action this provider answers.
    pub fn capture_action(&self) -> &'static str {
        actions::capture_action(self.modality)
    }

    /// The UIDAI device info action this provider answers.
    pub fn info_action(&self) -> &'static str {
        actions::info_action(self.modality)
    }
}

/// The known providers. Loaded once at process start; never mutated.
pub const PROVIDERS: [Provider; 4] = [
    Provider {
        id: "mantra_fp",
        label: "Mantra Fingerprint",
        package: "com.mantra.rdservice",
        modality: Modality::Finger,
    },
    Provider {
        id: "morpho_fp",
        label: "Morpho Fingerprint",
        package: "com.scl.rdservice",
        modality: Modality::Finger,
    },
    Provider {
        id: "mantra_iris",
        label: "Mantra Iris",
        package: "com.mantra.iris.rdservice",
        modality: Modality::Iris,
    },
    Provider {
        id: "face_rd",
        label: "Aadhaar Face RD",
        package: "in.gov.uidai.facerd",
        modality: Modality::Face,
    },
];

/// Look a provider up by its catalog identifier.
pub fn by_id(id: &str) -> Option<&'static Provider> {
    PROVIDERS.iter().find(|provider| provider.id == id)
}

/// Look a provider up by its package identifier.
pub fn by_package(package: &str) -> Option<&'static Provider> {
    PROVIDERS.iter().find(|provider| provider.package == package)
}

/// All cataloged providers for the given modality.
pub fn for_modality(modality: Modality) -> impl Iterator<Item = &'static Provider> {
    PROVIDERS
        .iter()
        .filter(move |provider| provider.modality == modality)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_provider_maps_to_the_uidai_face_capture_action() {
        let provider = by_id("face_rd").unwrap();
        assert_eq!(provider.capture_action(), actions::FACE_CAPTURE);
        assert_eq!(provider.info_action(), actions::FACE_INFO);
    }

    #[test]
    fn package_lookup_resolves_the_cataloged_modality() {
        let provider = by_package("com.mantra.iris.rdservice").unwrap();
        assert_eq!(provider.modality, Modality::Iris);
        assert_eq!(provider.capture_action(), actions::IRIS_CAPTURE);
    }

    #[test]
    fn modality_filter_partitions_the_catalog() {
        assert_eq!(for_modality(Modality::Finger).count(), 2);
        assert_eq!(for_modality(Modality::Iris).count(), 1);
        assert_eq!(for_modality(Modality::Face).count(), 1);
    }

    #[test]
    fn unknown_lookups_return_none() {
        assert!(by_id("nosuch").is_none());
        assert!(by_package("com.example.app").is_none());
    }
}
