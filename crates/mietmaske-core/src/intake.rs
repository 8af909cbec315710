//! The client intake record ("Mask A"): facts about the parties and the
//! property, entered once by the landlord or tenant.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, json_kind};
use crate::normalize::normalize_client_intake;
use crate::wire::{self, YesNo, wire_enum};

wire_enum! {
    /// Which side of the tenancy the client is on.
    pub enum Role {
        Landlord => "Vermieter" | "landlord",
        Tenant => "Mieter" | "tenant",
    }
}

wire_enum! {
    pub enum UnitType {
        CondoInApartmentBuilding => "Eigentumswohnung in Mehrfamilienhaus",
        DetachedHouse => "Einfamilienhaus",
        SemiDetachedHouse => "Doppelhaushälfte",
        TerracedHouse => "Reihenhaus",
        GrannyFlat => "Einliegerwohnung",
        HighRiseApartment => "Wohnung im Hochhaus",
        Other => "Sonstiges",
    }
}

wire_enum! {
    pub enum Parking {
        None => "Kein Stellplatz",
        Outdoor => "Außenstellplatz",
        UndergroundGarage => "Tiefgarage",
        Carport => "Carport",
    }
}

wire_enum! {
    pub enum NoiseSource {
        Nothing => "keine besonderen Lärmquellen",
        Traffic => "Straßen- / Verkehrslärm",
        Aircraft => "Fluglärm",
        Rail => "Bahn- / Tramverkehr",
        Nightlife => "Gastronomie / Clubbetrieb",
        Other => "Sonstige Hinweise",
    }
}

wire_enum! {
    pub enum ContractType {
        Unlimited => "Unbefristet",
        FixedTerm => "Befristet",
        Staggered => "Staffelmiete",
    }
}

wire_enum! {
    /// Statutory grounds for a fixed-term lease (§ 575 BGB).
    pub enum FixedTermReason {
        OwnUse => "Eigenbedarf",
        WorkRelocation => "Dienstlich",
        Renovation => "Sanierung",
        Sale => "Verkauf",
        ChangeOfUse => "Nutzungswechsel",
        Other => "Sonstiges",
    }
}

wire_enum! {
    pub enum PaymentMethod {
        BankTransfer => "Überweisung",
        DirectDebit => "SEPA-Lastschrift",
    }
}

wire_enum! {
    pub enum OperatingCostModel {
        Prepayment => "vorauszahlung",
        FlatRate => "pauschale",
    }
}

wire_enum! {
    pub enum Usage {
        Residential => "wohnen",
        ResidentialWithHomeOffice => "wohnen_gewerbe",
    }
}

wire_enum! {
    pub enum SublettingPlan {
        No => "nein",
        Partial => "teilweise",
        Full => "vollstaendig",
    }
}

wire_enum! {
    pub enum PetPolicy {
        SmallAnimals => "kleintiere",
        DogOrCat => "hund_katze",
        None => "keine",
        SpecialArrangement => "sondervereinbarung",
    }
}

wire_enum! {
    pub enum DepositSchedule {
        LumpSum => "Einmalig",
        Instalments => "In Raten",
    }
}

wire_enum! {
    pub enum DepositForm {
        EscrowTransfer => "Überweisung auf Treuhandkonto",
        Cash => "Barkaution",
        Guarantee => "Bürgschaft",
    }
}

/// Condition of the property at handover.
///
/// Older exports used free-text labels such as `neu erstellt`; those are
/// kept verbatim in [`Condition::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Condition {
    Renovated,
    PartiallyRenovated,
    Unrenovated,
    Other(String),
}

impl Condition {
    pub fn as_wire(&self) -> &str {
        match self {
            Condition::Renovated => "Renoviert",
            Condition::PartiallyRenovated => "Teilsaniert",
            Condition::Unrenovated => "Unrenoviert",
            Condition::Other(text) => text,
        }
    }
}

impl std::str::FromStr for Condition {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_lowercase().as_str() {
            "renoviert" => Condition::Renovated,
            "teilsaniert" => Condition::PartiallyRenovated,
            "unrenoviert" => Condition::Unrenovated,
            _ => Condition::Other(trimmed.to_string()),
        })
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for Condition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// Contact details of one party as entered in the intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientIntake {
    // ── Role & contact ──
    #[serde(
        rename = "rolle",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<Role>,
    #[serde(rename = "eigene_name", deserialize_with = "wire::text")]
    pub own_name: String,
    #[serde(rename = "eigene_anschrift", deserialize_with = "wire::text")]
    pub own_address: String,
    #[serde(rename = "eigene_email", deserialize_with = "wire::text")]
    pub own_email: String,
    #[serde(rename = "eigene_telefon", deserialize_with = "wire::text")]
    pub own_phone: String,
    #[serde(rename = "eigene_iban", deserialize_with = "wire::text")]
    pub own_iban: String,
    #[serde(rename = "ust_id", deserialize_with = "wire::text")]
    pub vat_id: String,
    #[serde(rename = "steuernummer", deserialize_with = "wire::text")]
    pub tax_number: String,
    #[serde(
        rename = "wird_vertreten",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub represented: Option<YesNo>,
    #[serde(rename = "vertreten_durch", deserialize_with = "wire::text")]
    pub representative: String,
    #[serde(
        rename = "vollmacht",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub power_of_attorney: Option<YesNo>,
    #[serde(
        rename = "gegenpartei",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub counterparty_known: Option<YesNo>,
    #[serde(rename = "gegenpartei_name", deserialize_with = "wire::text")]
    pub counterparty_name: String,
    #[serde(rename = "gegenpartei_anschrift", deserialize_with = "wire::text")]
    pub counterparty_address: String,
    #[serde(rename = "gegenpartei_email", deserialize_with = "wire::text")]
    pub counterparty_email: String,
    #[serde(rename = "gegenpartei_telefon", deserialize_with = "wire::text")]
    pub counterparty_phone: String,
    #[serde(rename = "gegenpartei_vertreten_durch", deserialize_with = "wire::text")]
    pub counterparty_representative: String,

    // ── Property ──
    #[serde(rename = "objektadresse", deserialize_with = "wire::text")]
    pub property_address: String,
    #[serde(rename = "wohnung_bez", deserialize_with = "wire::text")]
    pub unit_label: String,
    #[serde(
        rename = "wohnungsart",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_type: Option<UnitType>,
    #[serde(rename = "wohnflaeche", deserialize_with = "wire::text")]
    pub floor_area: String,
    #[serde(rename = "bezugsfertig", deserialize_with = "wire::text")]
    pub move_in_ready: String,
    #[serde(rename = "aussenbereich", deserialize_with = "wire::list")]
    pub outdoor_areas: Vec<String>,
    #[serde(rename = "nebenraeume", deserialize_with = "wire::list")]
    pub ancillary_rooms: Vec<String>,
    #[serde(
        rename = "stellplatz",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub parking: Option<Parking>,
    #[serde(rename = "stellplatz_nr", deserialize_with = "wire::text")]
    pub parking_number: String,
    #[serde(rename = "ausstattung", deserialize_with = "wire::text")]
    pub fittings: String,
    #[serde(
        rename = "weg",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub condo: Option<YesNo>,
    #[serde(rename = "mea", deserialize_with = "wire::text")]
    pub co_ownership_share: String,
    /// File name only; the content is never read.
    #[serde(rename = "grundriss_datei", deserialize_with = "wire::text")]
    pub floor_plan_file: String,
    #[serde(rename = "weg_dokument", deserialize_with = "wire::text")]
    pub condo_document_file: String,

    // ── Condition & keys ──
    #[serde(
        rename = "zustand",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub condition: Option<Condition>,
    #[serde(rename = "uebergabeprotokoll", deserialize_with = "wire::opt_flag")]
    pub handover_protocol: Option<bool>,
    #[serde(
        rename = "laerm",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub noise: Option<NoiseSource>,
    #[serde(rename = "schluessel_arten", deserialize_with = "wire::list")]
    pub key_types: Vec<String>,
    #[serde(rename = "schluessel_anzahl", deserialize_with = "wire::text")]
    pub key_count: String,

    // ── Lease term ──
    #[serde(rename = "mietbeginn", deserialize_with = "wire::text")]
    pub lease_start: String,
    #[serde(rename = "mietende", deserialize_with = "wire::text")]
    pub lease_end: String,
    #[serde(
        rename = "vertragsart",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub contract_type: Option<ContractType>,
    #[serde(
        rename = "befristungsgrund",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub fixed_term_reason: Option<FixedTermReason>,
    #[serde(rename = "befristungsgrund_text", deserialize_with = "wire::text")]
    pub fixed_term_justification: String,

    // ── Rent & costs ──
    #[serde(rename = "grundmiete", deserialize_with = "wire::text")]
    pub base_rent: String,
    #[serde(rename = "zuschlag_moeblierung", deserialize_with = "wire::text")]
    pub furnishing_surcharge: String,
    #[serde(rename = "zuschlag_teilgewerbe", deserialize_with = "wire::text")]
    pub commercial_surcharge: String,
    #[serde(rename = "zuschlag_unterverm", deserialize_with = "wire::text")]
    pub subletting_surcharge: String,
    #[serde(rename = "vz_heizung", deserialize_with = "wire::text")]
    pub heating_prepayment: String,
    #[serde(rename = "vz_bk", deserialize_with = "wire::text")]
    pub operating_cost_prepayment: String,
    #[serde(rename = "stellplatzmiete", deserialize_with = "wire::text")]
    pub parking_rent: String,
    #[serde(
        rename = "zahlungsart",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_method: Option<PaymentMethod>,
    #[serde(rename = "zahler_iban", deserialize_with = "wire::text")]
    pub payer_iban: String,
    #[serde(
        rename = "bk_modell",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub operating_cost_model: Option<OperatingCostModel>,
    #[serde(
        rename = "bk_weg",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub condo_cost_allocation: Option<YesNo>,

    // ── Usage & pets ──
    #[serde(
        rename = "nutzung",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub usage: Option<Usage>,
    #[serde(
        rename = "unterverm",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub subletting: Option<SublettingPlan>,
    #[serde(
        rename = "tiere",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub pets: Option<PetPolicy>,
    #[serde(rename = "tiere_details", deserialize_with = "wire::text")]
    pub pet_details: String,

    // ── Deposit & handover ──
    /// Deposit in months of base rent.
    #[serde(rename = "kaution", deserialize_with = "wire::text")]
    pub deposit_months: String,
    #[serde(
        rename = "kaution_zahlweise",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub deposit_schedule: Option<DepositSchedule>,
    #[serde(
        rename = "kautionsform",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub deposit_form: Option<DepositForm>,
    #[serde(rename = "uebergabedatum", deserialize_with = "wire::text")]
    pub handover_date: String,

    /// Keys this version does not know about, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClientIntake {
    /// An empty form as the client first sees it (three months' deposit preset).
    pub fn blank() -> Self {
        Self {
            deposit_months: "3".into(),
            ..Self::default()
        }
    }

    /// Decode an intake of any historical vintage.
    ///
    /// Legacy keys are migrated to their canonical names before decoding.
    /// Choice labels this version does not know are left unset and kept
    /// verbatim in `extra`.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        Self::decode(value).map(|(intake, _)| intake)
    }

    /// Like [`ClientIntake::from_value`], also returning the keys whose
    /// labels were not recognised.
    pub(crate) fn decode(value: Value) -> Result<(Self, Vec<String>), CoreError> {
        let map = match value {
            Value::Object(map) => map,
            other => return Err(CoreError::NotAnObject(json_kind(&other))),
        };
        let normalized = normalize_client_intake(map);
        let mut intake: Self = serde_json::from_value(Value::Object(normalized.clone()))?;
        let decoded = intake.to_map()?;
        let kept = wire::keep_unknown_choices(&normalized, &decoded, &mut intake.extra);
        Ok((intake, kept))
    }

    /// Serialise to a JSON object with canonical keys.
    pub fn to_map(&self) -> Result<Map<String, Value>, CoreError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(CoreError::NotAnObject(json_kind(&other))),
        }
    }

    pub fn own_contact(&self) -> Contact<'_> {
        Contact {
            name: &self.own_name,
            address: &self.own_address,
            email: &self.own_email,
            phone: &self.own_phone,
        }
    }

    pub fn counterparty_contact(&self) -> Contact<'_> {
        Contact {
            name: &self.counterparty_name,
            address: &self.counterparty_address,
            email: &self.counterparty_email,
            phone: &self.counterparty_phone,
        }
    }

    pub fn is_represented(&self) -> bool {
        self.represented.is_some_and(YesNo::is_yes)
    }

    pub fn counterparty_is_known(&self) -> bool {
        self.counterparty_known.is_some_and(YesNo::is_yes)
    }
}
