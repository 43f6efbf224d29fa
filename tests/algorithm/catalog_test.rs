//! Tests for the disease catalog

use claim_risk::{Criticality, DiseaseCatalog, DiseaseEntry, DiseaseMatch, OrganSystem};

#[test]
fn test_every_prefix_resolves_to_its_entry() {
    let catalog = DiseaseCatalog::standard();
    assert_eq!(catalog.len(), 23);

    for entry in catalog.entries() {
        let code = format!("{}.9", entry.code_prefix);
        let found = catalog.disease_for(&code);
        assert_eq!(found.name(), entry.name);
        assert_eq!(found.criticality(), Some(entry.criticality));
    }
}

#[test]
fn test_lookup_trims_and_uppercases() {
    let catalog = DiseaseCatalog::standard();
    let found = catalog.disease_for("  e11.65 ");
    assert_eq!(found.name(), "Type 2 Diabetes");
    assert_eq!(found.criticality(), Some(Criticality::High));
}

#[test]
fn test_unknown_codes_have_no_criticality() {
    let catalog = DiseaseCatalog::standard();
    for code in ["X99", "E1", "", "Q21.0", "12345"] {
        let found = catalog.disease_for(code);
        assert_eq!(found, DiseaseMatch::Unknown, "code {code:?}");
        assert_eq!(found.criticality(), None);
        assert_eq!(found.name(), "Unknown");
    }
}

#[test]
fn test_custom_catalog() {
    let catalog = DiseaseCatalog::from_entries(vec![DiseaseEntry::new(
        "A00",
        "Cholera",
        Criticality::Moderate,
        "Drink clean water.",
    )]);
    assert!(catalog.disease_for("A00.1").is_known());
    assert!(!catalog.disease_for("E11").is_known());
}

#[test]
fn test_organ_system_is_independent_of_disease_table() {
    let catalog = DiseaseCatalog::standard();
    assert_eq!(catalog.organ_system("Q21"), OrganSystem::Congenital);
    assert_eq!(catalog.organ_system("S72"), OrganSystem::Injury);
    assert_eq!(catalog.organ_system("T40"), OrganSystem::Injury);
    assert_eq!(catalog.organ_system("i10"), OrganSystem::Cardiovascular);
    assert_eq!(catalog.organ_system("U07"), OrganSystem::Unknown);
    assert_eq!(OrganSystem::all_categories().len(), 20);
}
