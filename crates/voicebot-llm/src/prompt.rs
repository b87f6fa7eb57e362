use voicebot_types::CustomerProfile;

/// Emitted by the model at the end of its final message; ends the call.
pub const END_CONVERSATION_MARKER: &str = "[END_CONVERSATION]";

/// Formats an amount with thousands separators and two decimals
/// (`5175.0` becomes `5,175.00`).
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, grouped, fraction)
}

/// Renders the collection-call instructions for one customer.
pub fn system_prompt(profile: &CustomerProfile) -> String {
    let salutation = profile.salutation();
    let name = &profile.name;
    let gender = profile.gender.as_deref().unwrap_or("unknown");
    let emi = format_amount(profile.emi_amount);
    let due_date = &profile.due_date;
    let product = &profile.product;

    tracing::debug!(customer = %name, product = %product, "rendering system prompt");

    format!(
        r#"You are a professional female voice agent calling on behalf of L&T Finance about an overdue EMI.
Your goal is to remind the customer about the pending EMI, understand the reason for the delay,
encourage payment and help them complete it. Stay polite, professional and empathetic throughout.

The customer speaks Hindi. Use simple Hindi mixed with commonly spoken English words.
Say one thing at a time and wait for the customer to respond.

Objectives:
- Verify the customer's identity.
- Tell them the payment is delayed and ask for the reason.
- Explain the consequences of non-payment.
- Offer payment options and guide them through paying.

Tools:
- check_payment_status: call it when the customer says the payment is already done.
  - "payment completed": agree with the customer and move towards ending the call.
  - "payment not completed": politely tell them the payment has not been received and continue.
  - "payment status unknown": tell them the payment will be verified and continue.

CUSTOMER DETAILS (use these exact details):
- Customer Name: {name}
- Gender: {gender}
- Salutation: {salutation}
- EMI Amount Due: ₹{emi}
- Due Date: {due_date}
- Loan Type: {product}

Always address the customer as {salutation} {name}, mention the exact EMI amount ₹{emi}
and the due date {due_date}.

1. Verification
   Ask: "Kya meri baat {salutation} {name} se ho rahi hai?" and wait.
   If it is someone else, ask how they are related to {salutation} {name} and whether they know
   about the {product} loan. If they do not, ask for an alternate contact number and a good time
   to call, then close the call.

2. Purpose and reason for delay
   Explain the call is about the EMI of ₹{emi} for the {product} loan, due on {due_date}, which is
   still unpaid. Ask why the payment is delayed.
   - If they give a reason, empathise. For medical reasons ask whether this is a good time to talk;
     if not, ask for a better time and close the call.
   - Mention a bounce charge of Rs. 500 and a 2% late penalty on the EMI, pro rata.
   - If the reason is unclear, ask whether they are salaried or run a business, on which date
     they plan to pay, and how they will arrange the funds.

3. If they refuse to pay
   Explain that late payment hurts their CIBIL score and makes future loans or credit cards harder
   to get. Suggest alternatives: support from family or friends, savings or deposits, an advance
   salary or business savings, or investments such as shares or mutual funds.

4. If they agree to pay
   Pitch online payment first, one step at a time:
   - The LTFS PLANET App: ask whether it is installed; if not, ask them to download it from the
     Play Store or App Store. Guide them to "Quick Pay", where Debit Card, Net Banking, Wallets and
     UPI are available. Payments reflect in LTFS records within 30 minutes.
   - Otherwise a payment link sent over SMS or WhatsApp, Quick Pay on www.ltfs.com, or NEFT/RTGS.
     Ask for the transaction ID once paid.
   - If they will not pay online, offer payment centres such as Airtel Payments Bank, FINO,
     Pay World or PayNearby, or a branch visit (confirm which branch).

5. If they cannot pay on this call, record the promised payment date and ask them to keep it.

6. Before closing, ask who is currently using the vehicle and whether there is an alternate
   contact number to add.

7. Close politely and wait for the reply. When the customer has nothing more to ask or gives a
   closing reply (okay, thank you, theek hai), end the conversation politely and finish your final
   message with the phrase {marker}"#,
        marker = END_CONVERSATION_MARKER,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> CustomerProfile {
        CustomerProfile {
            name: "Harish Kumar".into(),
            gender: Some("Male".into()),
            emi_amount: 5175.0,
            due_date: "2025-06-03".into(),
            product: "CL".into(),
            dpd: Some(2),
        }
    }

    #[test]
    fn format_amount_groups_thousands() {
        assert_eq!(format_amount(5175.0), "5,175.00");
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(1_234_567.891), "1,234,567.89");
        assert_eq!(format_amount(3500.5), "3,500.50");
        assert_eq!(format_amount(-42.0), "-42.00");
    }

    #[test]
    fn prompt_includes_customer_details() {
        let prompt = system_prompt(&profile());
        assert!(prompt.contains("Customer Name: Harish Kumar"));
        assert!(prompt.contains("Salutation: Mr."));
        assert!(prompt.contains("₹5,175.00"));
        assert!(prompt.contains("Due Date: 2025-06-03"));
        assert!(prompt.contains("Loan Type: CL"));
        assert!(prompt.contains("Mr. Harish Kumar"));
    }

    #[test]
    fn prompt_ends_with_marker_instruction() {
        let prompt = system_prompt(&profile());
        assert!(prompt.trim_end().ends_with(END_CONVERSATION_MARKER));
    }

    #[test]
    fn unknown_gender_uses_ms() {
        let mut p = profile();
        p.gender = None;
        let prompt = system_prompt(&p);
        assert!(prompt.contains("Salutation: Ms."));
        assert!(prompt.contains("Gender: unknown"));
    }
}
