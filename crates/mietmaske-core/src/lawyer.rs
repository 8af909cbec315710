//! The lawyer decision record ("Mask B"): clause and legal choices layered on
//! top of an imported client intake.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, json_kind};
use crate::normalize::normalize_lawyer_decisions;
use crate::wire::{self, YesNo, wire_enum};

wire_enum! {
    pub enum FinalContractType {
        Unlimited => "unbefristet",
        FixedTerm => "befristet",
    }
}

wire_enum! {
    /// How rent may be raised during the tenancy. The three modes exclude
    /// each other.
    pub enum RentAdjustment {
        /// Comparable-rent increases under § 558 BGB.
        Statutory => "normalfall",
        /// Index-linked rent under § 557b BGB.
        Indexed => "index",
        /// Staggered rent under § 557a BGB.
        Staggered => "staffel",
    }
}

wire_enum! {
    pub enum PaymentDue {
        ThirdWorkingDay => "spätestens 3. Werktag des Monats",
        Custom => "abweichende Regelung",
    }
}

wire_enum! {
    pub enum RentControlStatus {
        NewBuild => "neubau" | "Neubau (nie vermietet)",
        PreviouslyLet => "bereits_vermietet" | "Bereits vermietet",
    }
}

wire_enum! {
    pub enum PriorTenancy {
        BeforeJune2015 => "vor_juni_2015" | "vor dem 1. Juni 2015",
        AfterJune2015 => "nach_juni_2015" | "nach dem 1. Juni 2015",
    }
}

wire_enum! {
    /// Whether the agreed rent stays within the rent-control ceiling.
    pub enum RentLimit {
        Within => "ja" | "Ja, unter Grenze",
        Over => "nein" | "Nein, über Grenze",
    }
}

wire_enum! {
    pub enum SublettingClause {
        ConsentWithAssignment => "Zustimmung + Sicherungsabtretung",
        ConsentOnly => "nur Zustimmung",
        Custom => "individuell",
    }
}

wire_enum! {
    pub enum PetClauseTone {
        Standard => "Standard",
        Restrictive => "restriktiver",
        Custom => "individuell",
    }
}

wire_enum! {
    /// How the landlord compensates an unrenovated handover.
    pub enum Compensation {
        LumpSum => "zuschuss",
        RentFreeMonths => "mietfrei",
    }
}

wire_enum! {
    pub enum AnnualRepairCap {
        SixFold => "6fach",
        EightFold => "8fach",
        Custom => "individuell",
    }
}

wire_enum! {
    pub enum ReturnCondition {
        SweptClean => "besenrein",
        AsReceived => "wie_uebernommen",
        Custom => "individuell",
    }
}

wire_enum! {
    /// Landlord liability under § 536a BGB.
    pub enum LandlordLiability {
        ExclusionExceptPersonalInjury => "Ausschluss (außer Leben/Körper/Gesundheit)",
        Generic => "generisch",
        Custom => "individuell",
    }
}

wire_enum! {
    pub enum NoiseClause {
        Notice => "hinweis",
        None => "keine",
        Custom => "individuell",
    }
}

wire_enum! {
    pub enum SetOff {
        UndisputedOnly => "nur_unbestritten",
        Extended => "erweitert",
    }
}

wire_enum! {
    pub enum SaleRule {
        NoticeExclusion => "kuendigungsausschluss",
        TransferToBuyer => "weitergabe",
        Custom => "individuell",
    }
}

wire_enum! {
    /// Whether the contract gets the separate heating and hot-water
    /// paragraph. Written in lower case, unlike [`YesNo`].
    pub enum HeatingParagraph {
        Include => "ja" | "yes" | "true",
        Omit => "nein" | "no" | "false",
    }
}

wire_enum! {
    pub enum EnergyCertificate {
        Informative => "informativ",
        AcknowledgementRequired => "Kenntnisnahme verpflichtend",
    }
}

/// Intake values mirrored into the lawyer form for reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOnlySnapshot {
    #[serde(rename = "ro_rolle", deserialize_with = "wire::text")]
    pub role: String,
    #[serde(rename = "ro_name", deserialize_with = "wire::text")]
    pub name: String,
    #[serde(rename = "ro_email", deserialize_with = "wire::text")]
    pub email: String,
    #[serde(rename = "ro_telefon", deserialize_with = "wire::text")]
    pub phone: String,
    #[serde(rename = "ro_objektadresse", deserialize_with = "wire::text")]
    pub property_address: String,
    #[serde(rename = "ro_wohneinheit", deserialize_with = "wire::text")]
    pub unit: String,
    #[serde(rename = "ro_bezugsfertig", deserialize_with = "wire::text")]
    pub move_in_ready: String,
    #[serde(rename = "ro_mietbeginn", deserialize_with = "wire::text")]
    pub lease_start: String,
    #[serde(rename = "ro_grundmiete", deserialize_with = "wire::text")]
    pub base_rent: String,
    #[serde(rename = "ro_gesamtmiete", deserialize_with = "wire::text")]
    pub total_rent: String,
    #[serde(rename = "ro_vz_heizung", deserialize_with = "wire::text")]
    pub heating_prepayment: String,
}

/// Rent-control (Mietpreisbremse) questionnaire answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentControl {
    #[serde(
        rename = "mpb_status",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<RentControlStatus>,
    #[serde(
        rename = "mpb_vormiet",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub prior_tenancy: Option<PriorTenancy>,
    #[serde(
        rename = "mpb_grenze",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub limit: Option<RentLimit>,
    /// Justification: the previous tenant already paid this much (§ 556e Abs. 1).
    #[serde(rename = "mpb_vormiete", deserialize_with = "wire::flag")]
    pub prior_rent: bool,
    #[serde(rename = "mpb_vormiete_text", deserialize_with = "wire::text")]
    pub prior_rent_text: String,
    /// Justification: modernisation in the last three years (§ 556e Abs. 2).
    #[serde(rename = "mpb_modern", deserialize_with = "wire::flag")]
    pub modernisation: bool,
    #[serde(rename = "mpb_modern_text", deserialize_with = "wire::text")]
    pub modernisation_text: String,
    /// Justification: first letting after comprehensive modernisation (§ 556f).
    #[serde(rename = "mpb_erstmiete", deserialize_with = "wire::flag")]
    pub first_letting: bool,
    #[serde(rename = "mpb_erstmiete_text", deserialize_with = "wire::text")]
    pub first_letting_text: String,
}

impl RentControl {
    /// Whether any answer has been given yet.
    pub fn is_started(&self) -> bool {
        self.status.is_some()
            || self.prior_tenancy.is_some()
            || self.limit.is_some()
            || self.has_justification()
    }

    pub fn has_justification(&self) -> bool {
        self.prior_rent || self.modernisation || self.first_letting
    }
}

/// Which side carries redecoration duties (Schönheitsreparaturen).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenovationVariant {
    /// Handed over renovated; tenant redecorates.
    TenantObligation,
    /// Handed over unrenovated; no redecoration duty.
    NoObligation,
    /// Handed over unrenovated; tenant redecorates against compensation.
    ObligationWithCompensation,
}

impl RenovationVariant {
    pub const ALL: [RenovationVariant; 3] = [
        RenovationVariant::TenantObligation,
        RenovationVariant::NoObligation,
        RenovationVariant::ObligationWithCompensation,
    ];

    /// The checkbox key this variant occupies in exported JSON.
    pub fn wire_key(self) -> &'static str {
        match self {
            RenovationVariant::TenantObligation => "sr_renoviert",
            RenovationVariant::NoObligation => "sr_unrenoviert_ohne",
            RenovationVariant::ObligationWithCompensation => "sr_unrenoviert_mit",
        }
    }

    pub fn from_wire_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.wire_key() == key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Renovation {
    #[serde(rename = "sr_renoviert", deserialize_with = "wire::flag")]
    pub tenant_obligation: bool,
    #[serde(rename = "sr_unrenoviert_ohne", deserialize_with = "wire::flag")]
    pub no_obligation: bool,
    #[serde(rename = "sr_unrenoviert_mit", deserialize_with = "wire::flag")]
    pub with_compensation: bool,
    #[serde(
        rename = "sr_ausgleich_option",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub compensation: Option<Compensation>,
    #[serde(rename = "sr_ausgleich_betrag", deserialize_with = "wire::text")]
    pub compensation_amount: String,
    #[serde(rename = "sr_ausgleich_monate", deserialize_with = "wire::text")]
    pub rent_free_months: String,
}

impl Renovation {
    /// The selected variant. If an imported record has several boxes ticked,
    /// the first in [`RenovationVariant::ALL`] order wins.
    pub fn selected(&self) -> Option<RenovationVariant> {
        RenovationVariant::ALL
            .into_iter()
            .find(|variant| self.is_set(*variant))
    }

    pub fn is_set(&self, variant: RenovationVariant) -> bool {
        match variant {
            RenovationVariant::TenantObligation => self.tenant_obligation,
            RenovationVariant::NoObligation => self.no_obligation,
            RenovationVariant::ObligationWithCompensation => self.with_compensation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LawyerDecisions {
    #[serde(flatten)]
    pub snapshot: ReadOnlySnapshot,

    // ── Contract design ──
    #[serde(
        rename = "vertragsart_final",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub final_contract_type: Option<FinalContractType>,
    #[serde(rename = "kuendigungsverzicht", deserialize_with = "wire::text")]
    pub notice_waiver_years: String,

    // ── Rent & operating costs ──
    #[serde(
        rename = "mietanpassung_normalfall",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub rent_adjustment: Option<RentAdjustment>,
    #[serde(
        rename = "indexmiete",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub indexed_rent: Option<YesNo>,
    #[serde(
        rename = "staffelmiete",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub staggered_rent: Option<YesNo>,
    #[serde(rename = "staffelmiete_schedule", deserialize_with = "wire::text")]
    pub staggered_schedule: String,
    #[serde(
        rename = "faelligkeit",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub payment_due: Option<PaymentDue>,
    #[serde(flatten)]
    pub rent_control: RentControl,
    #[serde(rename = "zusatz_bk", deserialize_with = "wire::list")]
    pub extra_cost_items: Vec<String>,
    #[serde(rename = "weg_text", deserialize_with = "wire::text")]
    pub condo_reference: String,
    #[serde(
        rename = "heizww_paragraph",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub heating_paragraph: Option<HeatingParagraph>,

    // ── Usage ──
    #[serde(
        rename = "unterverm_klausel",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub subletting_clause: Option<SublettingClause>,
    #[serde(
        rename = "tiere_ton",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub pet_clause_tone: Option<PetClauseTone>,
    #[serde(rename = "bauveraenderung", deserialize_with = "wire::flag")]
    pub structural_changes: bool,
    #[serde(rename = "besichtigung", deserialize_with = "wire::flag")]
    pub viewing_access: bool,
    #[serde(rename = "heiz_separat", deserialize_with = "wire::flag")]
    pub heating_separate: bool,

    // ── Maintenance ──
    #[serde(flatten)]
    pub renovation: Renovation,
    #[serde(rename = "kleinrep_je_vorgang", deserialize_with = "wire::text")]
    pub repair_cap_per_incident: String,
    #[serde(
        rename = "kleinrep_jahr",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub repair_cap_annual: Option<AnnualRepairCap>,
    #[serde(
        rename = "endrueckgabe",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub return_condition: Option<ReturnCondition>,

    // ── Liability ──
    #[serde(
        rename = "haftung_536a",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub landlord_liability: Option<LandlordLiability>,
    #[serde(
        rename = "umgebung_laerm",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub ambient_noise: Option<NoiseClause>,
    #[serde(
        rename = "aufrechnung",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub set_off: Option<SetOff>,
    #[serde(
        rename = "veraeusserung",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub sale: Option<SaleRule>,

    // ── Attachments & approval ──
    #[serde(
        rename = "energieausweis_einbindung",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub energy_certificate: Option<EnergyCertificate>,
    #[serde(
        rename = "dsgvo_beiblatt",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub gdpr_notice: Option<YesNo>,
    #[serde(rename = "anlagen", deserialize_with = "wire::list")]
    pub attachments: Vec<String>,
    #[serde(rename = "bearbeiter", deserialize_with = "wire::text")]
    pub case_handler: String,
    #[serde(
        rename = "freigabe",
        deserialize_with = "wire::opt_enum",
        skip_serializing_if = "Option::is_none"
    )]
    pub approved: Option<YesNo>,
    #[serde(rename = "bearbeitungsdatum", deserialize_with = "wire::text")]
    pub processing_date: String,

    // ── Optional tenant contact, lawyer view only ──
    #[serde(rename = "mieter_email", deserialize_with = "wire::text")]
    pub tenant_email: String,
    #[serde(rename = "mieter_telefon", deserialize_with = "wire::text")]
    pub tenant_phone: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LawyerDecisions {
    /// An empty lawyer form (no notice waiver preset).
    pub fn blank() -> Self {
        Self {
            notice_waiver_years: "0".into(),
            ..Self::default()
        }
    }

    /// Decode decisions of any historical vintage.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(map) => Self::from_map(map),
            other => Err(CoreError::NotAnObject(json_kind(&other))),
        }
    }

    /// Decode a raw object. Unknown choice labels are left unset and kept
    /// verbatim in `extra`.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, CoreError> {
        Self::decode(map).map(|(decisions, _)| decisions)
    }

    /// Like [`LawyerDecisions::from_map`], also returning the keys whose
    /// labels were not recognised.
    pub(crate) fn decode(map: Map<String, Value>) -> Result<(Self, Vec<String>), CoreError> {
        let normalized = normalize_lawyer_decisions(map);
        let mut decisions: Self = serde_json::from_value(Value::Object(normalized.clone()))?;
        let decoded = decisions.to_map()?;
        let kept = wire::keep_unknown_choices(&normalized, &decoded, &mut decisions.extra);
        Ok((decisions, kept))
    }

    pub fn to_map(&self) -> Result<Map<String, Value>, CoreError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(CoreError::NotAnObject(json_kind(&other))),
        }
    }
}
