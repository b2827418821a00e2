//! Serde helpers for catalog and configuration enums

/// Implement case-insensitive deserialization for a field-less enum.
///
/// Catalog files spell template names and layers in mixed case
/// (`DefaultWrapper`, `F08`), so every accepted spelling is matched after
/// lowercasing the input.
///
/// ```
/// # use wrapgen_core::impl_case_insensitive_deserialize;
/// #[derive(Debug, PartialEq)]
/// enum Mode { Strict, Permissive }
///
/// impl_case_insensitive_deserialize!(
///     Mode,
///     Strict => "strict",
///     Permissive => "permissive"
/// );
///
/// let mode: Mode = serde_json::from_str(r#""STRICT""#).unwrap();
/// assert_eq!(mode, Mode::Strict);
/// ```
#[macro_export]
macro_rules! impl_case_insensitive_deserialize {
    ($enum_type:ty, $($variant:ident => $str_val:expr),+ $(,)?) => {
        impl<'de> serde::Deserialize<'de> for $enum_type {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                match s.to_lowercase().as_str() {
                    $(
                        $str_val => Ok(Self::$variant),
                    )+
                    _ => Err(serde::de::Error::custom(format!(
                        "unknown variant '{}', expected one of: {}",
                        s,
                        [$($str_val),+].join(", ")
                    ))),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Template {
        DefaultWrapper,
        FakeFinalizationWrapper,
    }

    impl_case_insensitive_deserialize!(
        Template,
        DefaultWrapper => "defaultwrapper",
        FakeFinalizationWrapper => "fakefinalizationwrapper"
    );

    #[test]
    fn test_case_insensitive_deserialize() {
        let result: Template = serde_json::from_str(r#""DefaultWrapper""#).unwrap();
        assert_eq!(result, Template::DefaultWrapper);

        let result: Template = serde_json::from_str(r#""FAKEFINALIZATIONWRAPPER""#).unwrap();
        assert_eq!(result, Template::FakeFinalizationWrapper);

        let result: Result<Template, _> = serde_json::from_str(r#""ProtoArgs""#);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown variant 'ProtoArgs'"));
        assert!(err.contains("expected one of: defaultwrapper, fakefinalizationwrapper"));
    }

    mod beside_result_alias {
        use crate::error::Result;

        #[derive(Debug, PartialEq, Eq)]
        pub enum Mode {
            Parent,
        }

        impl_case_insensitive_deserialize!(Mode, Parent => "parent");

        pub fn parse(text: &str) -> Result<Mode> {
            Ok(serde_json::from_str(text)?)
        }
    }

    #[test]
    fn test_expands_beside_crate_result_alias() {
        let mode = beside_result_alias::parse(r#""PARENT""#).unwrap();
        assert_eq!(mode, beside_result_alias::Mode::Parent);
    }
}
