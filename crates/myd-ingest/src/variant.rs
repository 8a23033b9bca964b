use myd_model::TargetFieldRecord;

/// Structure prefix that identifies a variant's fields: `{prefix}{VARIANT}`.
pub fn variant_pattern(table_prefix: &str, variant: &str) -> String {
    format!("{table_prefix}{}", variant.to_uppercase())
}

/// Keeps the records whose `transformer_id` starts with the variant pattern.
pub fn filter_by_variant(
    records: Vec<TargetFieldRecord>,
    table_prefix: &str,
    variant: &str,
) -> Vec<TargetFieldRecord> {
    let pattern = variant_pattern(table_prefix, variant);
    records
        .into_iter()
        .filter(|record| record.transformer_id.starts_with(&pattern))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_matching_structures() {
        let records = vec![
            TargetFieldRecord::new("S_BNKA", "BANKL", "S_"),
            TargetFieldRecord::new("S_KNA1", "KUNNR", "S_"),
            TargetFieldRecord::new("S_BNKA_EXT", "ZZFLAG", "S_"),
        ];
        let kept = filter_by_variant(records, "S_", "bnka");
        let fields: Vec<&str> = kept.iter().map(|r| r.sap_field.as_str()).collect();
        assert_eq!(fields, vec!["BANKL", "ZZFLAG"]);
        assert_eq!(variant_pattern("S_", "bnka"), "S_BNKA");
    }
}
