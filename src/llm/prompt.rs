use crate::structure::TableInfo;

/// Build the generation prompt for one table. The scraped reference data is
/// embedded as JSON so the model restates it in the exact output shape
/// instead of inventing fields.
pub fn build_structure_prompt(info: &TableInfo) -> String {
    let info_json = serde_json::to_string_pretty(info).unwrap_or_else(|_| "{}".to_string());

    format!(
        "you describe sap table structures.\n\
         generate a single json object for the sap table below.\n\
         - output only the json object. no markdown, no commentary, no backticks.\n\
         - use exactly this shape:\n\
         {{\n\
           \"name\": \"table_name\",\n\
           \"description\": \"table_description\",\n\
           \"fields\": [\n\
             {{\n\
               \"name\": \"field_name\",\n\
               \"data_element\": \"data_element\",\n\
               \"type\": \"data_type\",\n\
               \"length\": \"length\",\n\
               \"decimals\": \"decimals\"\n\
             }}\n\
           ]\n\
         }}\n\
         - every value is a string. keep the field order as given.\n\n\
         table reference data:\n{}",
        info_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::FieldDescriptor;

    #[test]
    fn prompt_embeds_reference_data_and_shape() {
        let info = TableInfo {
            table_name: "TCURR".into(),
            description: "Exchange Rates".into(),
            fields: vec![FieldDescriptor {
                name: "KURST".into(),
                data_element: "KURST_CURR".into(),
                ty: "CHAR".into(),
                length: "4".into(),
                decimals: "0".into(),
            }],
        };

        let prompt = build_structure_prompt(&info);
        assert!(prompt.contains("\"data_element\""));
        assert!(prompt.contains("\"type\""));
        assert!(prompt.contains("\"decimals\""));
        assert!(prompt.contains("TCURR"));
        assert!(prompt.contains("KURST_CURR"));
        assert!(prompt.contains("table reference data:"));
    }
}
