use serde::{Deserialize, Deserializer, Serialize};

use crate::metrics::{Category, Counter, LtvProduct, SubChannel};

macro_rules! sales_counters {
    (
        sales { $( $sales_field:ident / $sales_alias:literal => ($category:ident, $channel:ident) ),* $(,)? }
        ltv { $( $ltv_field:ident $(/ $ltv_alias:literal)? => $product:ident ),* $(,)? }
    ) => {
        /// Raw integer counters for one staff member on one day, or the sum of
        /// several such rows. Absent or malformed values decode to 0; a single
        /// decoded value never exceeds `u32::MAX`, sums are held as `u64`.
        #[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(default)]
        pub struct SalesCounters {
            $(
                #[serde(alias = $sales_alias, deserialize_with = "lenient_count")]
                pub $sales_field: u64,
            )*
            $(
                #[serde($(alias = $ltv_alias,)? deserialize_with = "lenient_count")]
                pub $ltv_field: u64,
            )*
        }

        impl SalesCounters {
            pub fn get(&self, counter: Counter) -> u64 {
                match counter {
                    $( Counter::Sales(Category::$category, SubChannel::$channel) => self.$sales_field, )*
                    $( Counter::Ltv(LtvProduct::$product) => self.$ltv_field, )*
                }
            }

            pub fn set(&mut self, counter: Counter, value: u64) {
                match counter {
                    $( Counter::Sales(Category::$category, SubChannel::$channel) => self.$sales_field = value, )*
                    $( Counter::Ltv(LtvProduct::$product) => self.$ltv_field = value, )*
                }
            }

            /// Adds every counter of `other` into `self`, saturating at `u64::MAX`.
            pub fn accumulate(&mut self, other: &SalesCounters) {
                $( self.$sales_field = self.$sales_field.saturating_add(other.$sales_field); )*
                $( self.$ltv_field = self.$ltv_field.saturating_add(other.$ltv_field); )*
            }
        }
    };
}

sales_counters! {
    sales {
        au_mnp_sp1 / "auMnpSp1" => (AuMnp, Sp1),
        au_mnp_sp2 / "auMnpSp2" => (AuMnp, Sp2),
        au_mnp_sim / "auMnpSim" => (AuMnp, Sim),
        uq_mnp_sp1 / "uqMnpSp1" => (UqMnp, Sp1),
        uq_mnp_sp2 / "uqMnpSp2" => (UqMnp, Sp2),
        uq_mnp_sim / "uqMnpSim" => (UqMnp, Sim),
        au_new_sp1 / "auNewSp1" => (AuNew, Sp1),
        au_new_sp2 / "auNewSp2" => (AuNew, Sp2),
        au_new_sim / "auNewSim" => (AuNew, Sim),
        uq_new_sp1 / "uqNewSp1" => (UqNew, Sp1),
        uq_new_sp2 / "uqNewSp2" => (UqNew, Sp2),
        uq_new_sim / "uqNewSim" => (UqNew, Sim),
        cell_up_sp1 / "cellUpSp1" => (CellUp, Sp1),
        cell_up_sp2 / "cellUpSp2" => (CellUp, Sp2),
        cell_up_sim / "cellUpSim" => (CellUp, Sim),
    }
    ltv {
        credit_card / "creditCard" => CreditCard,
        device_warranty / "deviceWarranty" => DeviceWarranty,
        online_service / "onlineService" => OnlineService,
        electricity => Electricity,
        gas => Gas,
    }
}

impl SalesCounters {
    /// Decodes a stored JSON counters object. Anything that is not an object
    /// yields an all-zero row.
    pub fn from_json_lenient(raw: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(raw) {
            Ok(value @ serde_json::Value::Object(_)) => {
                serde_json::from_value(value).unwrap_or_default()
            }
            _ => Self::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Accepts integers, floats (truncated) and numeric strings. Null, negative,
/// non-finite, out-of-range and non-numeric input become 0.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match RawCount::deserialize(deserializer)? {
        RawCount::Unsigned(value) => u32::try_from(value).map(u64::from).unwrap_or(0),
        RawCount::Signed(value) => u32::try_from(value).map(u64::from).unwrap_or(0),
        RawCount::Float(value) => count_from_float(value),
        RawCount::Text(text) => text.trim().parse::<f64>().map(count_from_float).unwrap_or(0),
        RawCount::Other(_) => 0,
    };
    Ok(count)
}

fn count_from_float(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 || value > f64::from(u32::MAX) {
        return 0;
    }
    value.trunc() as u64
}

/// Free-text notes attached to an event's performance row or a daily entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Narrative {
    pub highlights: Option<String>,
    pub challenges: Option<String>,
    pub next_actions: Option<String>,
}

impl Narrative {
    /// Fills each still-empty field from `other`. Fields that already hold
    /// text are never overwritten.
    pub fn fill_from(&mut self, other: &Narrative) {
        fill_first(&mut self.highlights, &other.highlights);
        fill_first(&mut self.challenges, &other.challenges);
        fill_first(&mut self.next_actions, &other.next_actions);
    }

    pub fn is_empty(&self) -> bool {
        !has_text(&self.highlights) && !has_text(&self.challenges) && !has_text(&self.next_actions)
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|text| !text.trim().is_empty())
}

fn fill_first(slot: &mut Option<String>, candidate: &Option<String>) {
    if !has_text(slot) && has_text(candidate) {
        *slot = candidate.clone();
    }
}

/// Grouping identity of a staff member. Currently the display name, compared
/// exactly; case and surrounding whitespace are significant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StaffKey<'a>(&'a str);

impl<'a> StaffKey<'a> {
    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

/// One staff member's counters for one day of one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
    #[serde(alias = "staffName")]
    pub staff_name: String,
    #[serde(alias = "dayIndex")]
    pub day: u32,
    #[serde(flatten)]
    pub counters: SalesCounters,
    #[serde(default)]
    pub notes: Narrative,
}

impl DailyRecord {
    pub fn new(staff_name: impl Into<String>, day: u32, counters: SalesCounters) -> Self {
        Self { staff_name: staff_name.into(), day, counters, notes: Narrative::default() }
    }

    pub fn staff_key(&self) -> StaffKey<'_> {
        StaffKey(&self.staff_name)
    }

    pub fn with_notes(mut self, notes: Narrative) -> Self {
        self.notes = notes;
        self
    }
}
