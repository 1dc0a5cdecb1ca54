// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Entity vocabulary — the closed set of sensitive-data categories the token
// classifier can emit, the BIO tag vocabulary indexed by model output, and
// the process-wide placeholder table used when masking.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use crate::error::{DocmaskError, Result};

/// Placeholder substituted for entity types without a dedicated mask.
pub const FALLBACK_PLACEHOLDER: &str = "{MASKED}";

macro_rules! entity_types {
    (@placeholder $placeholder:literal) => { Some($placeholder) };
    (@placeholder) => { None };
    ($( $variant:ident => $label:literal $(, $placeholder:literal)? ; )*) => {
        /// Sensitive-data category detected by the token classifier.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum EntityType {
            $( $variant, )*
        }

        impl EntityType {
            /// Every entity type in vocabulary order.
            pub const ALL: &'static [EntityType] = &[ $( EntityType::$variant, )* ];

            /// Canonical upper-case label, as it appears after `B-`/`I-`.
            pub fn label(&self) -> &'static str {
                match self {
                    $( EntityType::$variant => $label, )*
                }
            }

            /// Dedicated placeholder, if the type has one.
            pub fn default_placeholder(&self) -> Option<&'static str> {
                match self {
                    $( EntityType::$variant => entity_types!(@placeholder $($placeholder)?), )*
                }
            }
        }
    };
}

entity_types! {
    AadhaarId => "AADHAAR_ID", "{Aadhaar_ID}";
    AccountName => "ACCOUNTNAME", "{Account_Name}";
    AccountNumber => "ACCOUNTNUMBER", "{Account_Number}";
    Address => "ADDRESS", "{Address}";
    Age => "AGE", "{Age}";
    Amount => "AMOUNT", "{Amount}";
    Bank => "BANK", "{Bank}";
    Bban => "BBAN", "{BBAN}";
    Bic => "BIC", "{BIC}";
    BitcoinAddress => "BITCOINADDRESS", "{Bitcoin_Address}";
    BuildingNumber => "BUILDINGNUMBER", "{Building_Number}";
    City => "CITY", "{City}";
    CompanyName => "COMPANY_NAME", "{Company_Name}";
    County => "COUNTY";
    CreditCardCvv => "CREDITCARDCVV", "{Card_CVV}";
    CreditCardIssuer => "CREDITCARDISSUER";
    CreditCardNumber => "CREDITCARDNUMBER", "{Card_Number}";
    Currency => "CURRENCY", "{Currency}";
    CurrencyCode => "CURRENCYCODE";
    CurrencyName => "CURRENCYNAME";
    CurrencySymbol => "CURRENCYSYMBOL";
    Date => "DATE", "{Date}";
    DateOfBirth => "DATE_OF_BIRTH", "{DOB}";
    DriverLicense => "DRIVER_LICENSE", "{Driver_License}";
    Email => "EMAIL", "{E-Mail}";
    EthereumAddress => "ETHEREUMADDRESS", "{Ethereum_Address}";
    FirstName => "FIRSTNAME", "{First_Name}";
    FullName => "FULLNAME", "{Full_Name}";
    Gender => "GENDER", "{Gender}";
    Iban => "IBAN", "{IBAN}";
    Ip => "IP", "{IP}";
    Ipv4 => "IPV4";
    Ipv6 => "IPV6";
    JobArea => "JOBAREA";
    JobDescriptor => "JOBDESCRIPTOR";
    JobTitle => "JOBTITLE";
    JobType => "JOBTYPE";
    LastName => "LASTNAME";
    Latitude => "LATITUDE";
    LicensePlate => "LICENSE_PLATE";
    LitecoinAddress => "LITECOINADDRESS";
    Longitude => "LONGITUDE";
    Mac => "MAC";
    MaskedNumber => "MASKEDNUMBER";
    MiddleName => "MIDDLENAME";
    PanNumber => "PAN_NUMBER", "{PAN_Number}";
    Password => "PASSWORD", "{Password}";
    PhoneImei => "PHONEIMEI";
    PhoneNumber => "PHONE_NUMBER", "{Phone_Number}";
    Pin => "PIN";
    Prefix => "PREFIX";
    SecondaryAddress => "SECONDARYADDRESS";
    Sex => "SEX";
    Ssn => "SSN", "{SSN}";
    State => "STATE", "{State}";
    Street => "STREET";
    StreetAddress => "STREETADDRESS", "{Street_Address}";
    Suffix => "SUFFIX";
    Time => "TIME";
    Url => "URL", "{URL}";
    UserAgent => "USERAGENT";
    Username => "USERNAME", "{Username}";
    VehicleVin => "VEHICLEVIN", "{Vehicle_VIN}";
    VehicleVrm => "VEHICLEVRM";
    ZipCode => "ZIPCODE", "{ZIP_Code}";
}

impl EntityType {
    /// Look up a type by label. Matching is case-insensitive so that
    /// mixed-case model labels such as `FirstNAME` resolve.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.label().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// BIO tags
// ---------------------------------------------------------------------------

/// A BIO tag attached to one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `O` — not part of any entity.
    Outside,
    /// `B-<TYPE>` — first token of an entity.
    Begin(EntityType),
    /// `I-<TYPE>` — continuation of an entity.
    Inside(EntityType),
}

impl Tag {
    /// Parse a label such as `O`, `B-EMAIL`, or `I-PHONE_NUMBER`.
    pub fn parse(label: &str) -> Option<Self> {
        if label == "O" {
            return Some(Self::Outside);
        }
        if let Some(rest) = label.strip_prefix("B-") {
            return EntityType::from_label(rest).map(Self::Begin);
        }
        if let Some(rest) = label.strip_prefix("I-") {
            return EntityType::from_label(rest).map(Self::Inside);
        }
        None
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Outside => f.write_str("O"),
            Self::Begin(ty) => write!(f, "B-{ty}"),
            Self::Inside(ty) => write!(f, "I-{ty}"),
        }
    }
}

/// Label list of the standard token classifier, indexed by class id.
const STANDARD_TAG_LABELS: &[&str] = &[
    "O", "B-AADHAAR_ID", "B-ACCOUNTNAME", "B-ACCOUNTNUMBER", "B-ADDRESS", "B-AGE",
    "B-AMOUNT", "B-BANK", "B-BBAN", "B-BIC", "B-BITCOINADDRESS", "B-BUILDINGNUMBER",
    "B-CITY", "B-COMPANY_NAME", "B-COUNTY", "B-CREDITCARDCVV", "B-CREDITCARDISSUER", "B-CREDITCARDNUMBER",
    "B-CURRENCY", "B-CURRENCYCODE", "B-CURRENCYNAME", "B-CURRENCYSYMBOL", "B-DATE", "B-DATE_OF_BIRTH",
    "B-DRIVER_LICENSE", "B-EMAIL", "B-ETHEREUMADDRESS", "B-FirstNAME", "B-FULLNAME", "B-GENDER",
    "B-IBAN", "B-IP", "B-IPV4", "B-IPV6", "B-JOBAREA", "B-JOBDESCRIPTOR",
    "B-JOBTITLE", "B-JOBTYPE", "B-LASTNAME", "B-LATITUDE", "B-LICENSE_PLATE", "B-LITECOINADDRESS",
    "B-LONGITUDE", "B-MAC", "B-MASKEDNUMBER", "B-MIDDLENAME", "B-PAN_NUMBER", "B-PASSWORD",
    "B-PHONEIMEI", "B-PHONE_NUMBER", "B-PIN", "B-PREFIX", "B-SECONDARYADDRESS", "B-SEX",
    "B-SSN", "B-STATE", "B-STREET", "B-STREETADDRESS", "B-SUFFIX", "B-TIME",
    "B-URL", "B-USERAGENT", "B-USERNAME", "B-VEHICLEVIN", "B-VEHICLEVRM", "B-ZIPCODE",
    "I-AADHAAR_ID", "I-ACCOUNTNAME", "I-ACCOUNTNUMBER", "I-ADDRESS", "I-AGE", "I-AMOUNT",
    "I-BANK", "I-BBAN", "I-BIC", "I-BITCOINADDRESS", "I-BUILDINGNUMBER", "I-CITY",
    "I-COMPANY_NAME", "I-CREDITCARDCVV", "I-CREDITCARDISSUER", "I-CREDITCARDNUMBER", "I-CURRENCY", "I-CURRENCYCODE",
    "I-CURRENCYNAME", "I-CURRENCYSYMBOL", "I-DATE", "I-DATE_OF_BIRTH", "I-DRIVER_LICENSE", "I-EMAIL",
    "I-ETHEREUMADDRESS", "I-FirstNAME", "I-FULLNAME", "I-GENDER", "I-IBAN", "I-IP",
    "I-IPV4", "I-IPV6", "I-JOBAREA", "I-JOBTITLE", "I-JOBTYPE", "I-LASTNAME",
    "I-LATITUDE", "I-LICENSE_PLATE", "I-LITECOINADDRESS", "I-LONGITUDE", "I-MAC", "I-MASKEDNUMBER",
    "I-MIDDLENAME", "I-PAN_NUMBER", "I-PASSWORD", "I-PHONEIMEI", "I-PHONE_NUMBER", "I-PIN",
    "I-PREFIX", "I-SECONDARYADDRESS", "I-SSN", "I-STATE", "I-STREET", "I-STREETADDRESS",
    "I-SUFFIX", "I-TIME", "I-URL", "I-USERAGENT", "I-USERNAME", "I-VEHICLEVIN",
    "I-VEHICLEVRM", "I-ZIPCODE", "O",
];

/// Maps classifier output indices to BIO tags.
#[derive(Debug, Clone)]
pub struct TagVocabulary {
    tags: Vec<Tag>,
}

impl TagVocabulary {
    /// The vocabulary of the standard PII token classifier.
    pub fn standard() -> &'static TagVocabulary {
        static STANDARD: LazyLock<TagVocabulary> = LazyLock::new(|| TagVocabulary {
            // One entry per label so class ids never shift; every label is
            // checked to parse in the tests below.
            tags: STANDARD_TAG_LABELS
                .iter()
                .map(|label| Tag::parse(label).unwrap_or(Tag::Outside))
                .collect(),
        });
        &STANDARD
    }

    /// Build a vocabulary from an explicit label list (index = class id).
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        let tags = labels
            .iter()
            .map(|label| {
                let label = label.as_ref();
                Tag::parse(label)
                    .ok_or_else(|| DocmaskError::Config(format!("unknown tag label '{label}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { tags })
    }

    /// Tag for a class id, or `None` when the id is outside the vocabulary.
    pub fn tag(&self, index: usize) -> Option<Tag> {
        self.tags.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Mask table
// ---------------------------------------------------------------------------

/// Read-only mapping from entity type to placeholder text.
///
/// Built once at start-up and shared by reference; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct MaskTable {
    placeholders: HashMap<EntityType, String>,
    fallback: String,
}

impl MaskTable {
    /// The standard table: every type with a dedicated placeholder, and
    /// [`FALLBACK_PLACEHOLDER`] for the rest.
    pub fn standard() -> &'static MaskTable {
        static STANDARD: LazyLock<MaskTable> = LazyLock::new(MaskTable::build_standard);
        &STANDARD
    }

    fn build_standard() -> MaskTable {
        let placeholders = EntityType::ALL
            .iter()
            .filter_map(|ty| ty.default_placeholder().map(|p| (*ty, p.to_string())))
            .collect();
        MaskTable {
            placeholders,
            fallback: FALLBACK_PLACEHOLDER.to_string(),
        }
    }

    /// Standard table with per-label overrides applied on top.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self> {
        let mut table = Self::build_standard();
        for (label, placeholder) in overrides {
            let ty = EntityType::from_label(label).ok_or_else(|| {
                DocmaskError::Config(format!("placeholder override for unknown entity '{label}'"))
            })?;
            table.placeholders.insert(ty, placeholder.clone());
        }
        Ok(table)
    }

    /// Placeholder for an entity type.
    pub fn placeholder(&self, entity_type: EntityType) -> &str {
        self.placeholders
            .get(&entity_type)
            .map(String::as_str)
            .unwrap_or(&self.fallback)
    }
}
