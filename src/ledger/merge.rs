use std::collections::HashMap;

use crate::model::attendance::AttendanceRecord;

/// Collapses rows sharing an id, keeping the last written version at the
/// position of the first occurrence.
///
/// A write that the store applied but reported as failed gets appended again
/// on the caller's retry; this folds such doubles back into one row.
pub fn dedupe_latest(records: Vec<AttendanceRecord>) -> Vec<AttendanceRecord> {
    let mut slot: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut out: Vec<AttendanceRecord> = Vec::with_capacity(records.len());

    for record in records {
        match slot.get(&record.id) {
            Some(&i) => out[i] = record,
            None => {
                slot.insert(record.id.clone(), out.len());
                out.push(record);
            }
        }
    }

    out
}
