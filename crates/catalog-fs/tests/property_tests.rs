use catalog_fs::NormalizedPath;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_normalization_invariants(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        let as_str = path.as_str();

        prop_assert!(!as_str.contains('\\'));
        prop_assert!(!as_str.contains("//"));
        prop_assert!(as_str == "/" || !as_str.ends_with('/'));
        prop_assert!(!as_str.is_empty());

        // Normalization is idempotent
        let again = NormalizedPath::new(as_str);
        prop_assert_eq!(again.as_str(), as_str);
    }

    #[test]
    fn test_join_then_strip_prefix_roundtrips(
        base in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
        rest in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
    ) {
        let base = NormalizedPath::new(&base);
        let joined = base.join(&rest);
        prop_assert!(joined.starts_with(&base));
        let stripped = joined.strip_prefix(&base).unwrap();
        prop_assert_eq!(stripped, NormalizedPath::new(&rest));
    }
}
