//! Field layout of the `queryTrain` submission.

use crate::models::{SearchRequest, SearchTokens};

const TICKET: &str = "ticketOrderParamList[0]";

/// Ordered, possibly repeated form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }

    /// All values submitted under `name`, in order.
    #[cfg(test)]
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// `application/x-www-form-urlencoded` body, repeated keys kept in order.
    pub fn encode(&self) -> String {
        self.pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Build the exact field set the search endpoint expects.
pub fn build_form(tokens: &SearchTokens, request: &SearchRequest) -> FormFields {
    let mut form = FormFields::default();
    let ticket = |field: &str| format!("{TICKET}.{field}");

    form.push("_csrf", &tokens.csrf);
    form.push("custIdTypeEnum", "PERSON_ID");
    form.push("pid", &request.passenger_id);
    form.push("tripType", "ONEWAY");
    form.push("orderType", "BY_TIME");
    form.push(ticket("tripNo"), "TRIP1");
    form.push(
        ticket("startStation"),
        format!("{}-{}", request.origin_code, request.origin_name),
    );
    form.push(
        ticket("endStation"),
        format!("{}-{}", request.destination_code, request.destination_name),
    );
    form.push(ticket("rideDate"), &request.ride_date);
    form.push(ticket("startOrEndTime"), "true");
    form.push(ticket("startTime"), &request.start_time);
    form.push(ticket("endTime"), &request.end_time);
    form.push(ticket("normalQty"), request.seat_qty.to_string());
    form.push(ticket("wheelChairQty"), "0");
    form.push(ticket("parentChildQty"), "0");
    for slot in 0..3 {
        form.push(ticket(&format!("trainNoList[{slot}]")), "");
    }
    for train_type in &request.train_types {
        form.push(ticket("trainTypeList"), train_type);
    }
    form.push(ticket("chgSeat"), "true");
    form.push(ticket("seatPref"), "NONE");
    form.push("completeToken", &tokens.complete_token);

    form
}
