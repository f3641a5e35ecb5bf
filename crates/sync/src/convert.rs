//! Conversions between wire types and domain models.

use crisiscleanup_api_client::{
    NetworkIncident, NetworkWorkType, NetworkWorksiteFlag, NetworkWorksiteFull,
    NetworkWorksiteNote, NetworkWorksiteShort, WorksitePushPayload,
};
use crisiscleanup_core::incidents::Incident;
use crisiscleanup_core::worksites::{WorkType, Worksite, WorksiteFlag, WorksiteNote};

pub(crate) fn incident_from_network(remote: NetworkIncident) -> Incident {
    let updated_at = remote.updated_at.unwrap_or_else(|| remote.start_at.clone());
    Incident {
        id: remote.id,
        name: remote.name,
        short_name: remote.short_name,
        incident_type: remote.incident_type,
        start_at: remote.start_at,
        active_phone_number: remote.active_phone_number,
        turn_on_release: remote.turn_on_release,
        is_archived: remote.is_archived,
        updated_at,
    }
}

fn work_type_from_network(remote: NetworkWorkType) -> WorkType {
    WorkType {
        id: remote.id,
        work_type: remote.work_type,
        status: remote.status,
        claimed_by: remote.claimed_by,
    }
}

fn flag_from_network(remote: NetworkWorksiteFlag) -> WorksiteFlag {
    WorksiteFlag {
        reason_t: remote.reason_t,
        is_high_priority: remote.is_high_priority,
        notes: remote.notes,
    }
}

fn note_from_network(remote: NetworkWorksiteNote) -> WorksiteNote {
    WorksiteNote {
        created_at: remote.created_at,
        note: remote.note,
    }
}

pub(crate) fn worksite_from_short(remote: NetworkWorksiteShort) -> Worksite {
    Worksite {
        id: String::new(),
        network_id: remote.id,
        incident_id: remote.incident,
        name: remote.name,
        case_number: remote.case_number,
        address: remote.address,
        city: remote.city,
        county: remote.county,
        state: remote.state,
        postal_code: remote.postal_code,
        latitude: remote.latitude,
        longitude: remote.longitude,
        phone1: remote.phone1,
        email: None,
        reported_by: None,
        svi: remote.svi,
        what3words: None,
        updated_at: remote.updated_at,
        work_types: remote
            .work_types
            .into_iter()
            .map(work_type_from_network)
            .collect(),
        flags: Vec::new(),
        notes: Vec::new(),
        has_full_data: false,
        is_local_modified: false,
        local_modified_at: None,
    }
}

pub(crate) fn worksite_from_full(remote: NetworkWorksiteFull) -> Worksite {
    Worksite {
        id: String::new(),
        network_id: remote.id,
        incident_id: remote.incident,
        name: remote.name,
        case_number: remote.case_number,
        address: remote.address,
        city: remote.city,
        county: remote.county,
        state: remote.state,
        postal_code: remote.postal_code,
        latitude: remote.latitude,
        longitude: remote.longitude,
        phone1: remote.phone1,
        email: remote.email,
        reported_by: remote.reported_by,
        svi: remote.svi,
        what3words: remote.what3words,
        updated_at: remote.updated_at,
        work_types: remote
            .work_types
            .into_iter()
            .map(work_type_from_network)
            .collect(),
        flags: remote.flags.into_iter().map(flag_from_network).collect(),
        notes: remote.notes.into_iter().map(note_from_network).collect(),
        has_full_data: true,
        is_local_modified: false,
        local_modified_at: None,
    }
}

pub(crate) fn push_payload_from_worksite(worksite: &Worksite) -> WorksitePushPayload {
    WorksitePushPayload {
        incident: worksite.incident_id,
        name: worksite.name.clone(),
        case_number: if worksite.case_number.is_empty() {
            None
        } else {
            Some(worksite.case_number.clone())
        },
        address: worksite.address.clone(),
        city: worksite.city.clone(),
        county: worksite.county.clone(),
        state: worksite.state.clone(),
        postal_code: worksite.postal_code.clone(),
        latitude: worksite.latitude,
        longitude: worksite.longitude,
        phone1: worksite.phone1.clone(),
        email: worksite.email.clone(),
        what3words: worksite.what3words.clone(),
        work_types: worksite
            .work_types
            .iter()
            .map(|work_type| NetworkWorkType {
                id: work_type.id,
                work_type: work_type.work_type.clone(),
                status: work_type.status.clone(),
                claimed_by: work_type.claimed_by,
            })
            .collect(),
    }
}
