//! Property tests for Context clone independence (testable property #2).

use proptest::prelude::*;
use recipe_core::Context;
use serde_json::json;

proptest! {
    #[test]
    fn clone_mutations_do_not_cross_pollinate(
        key in "[a-z]{1,8}",
        original_value in any::<i64>(),
        mutated_value in any::<i64>(),
    ) {
        let mut original = Context::new();
        original.set(key.clone(), json!(original_value));

        let mut cloned = original.clone_deep();
        cloned.set(key.clone(), json!(mutated_value));

        prop_assert_eq!(original.get(&key).unwrap(), json!(original_value));
        prop_assert_eq!(cloned.get(&key).unwrap(), json!(mutated_value));
    }
}
