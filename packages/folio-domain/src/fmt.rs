/// US-style currency rendering, e.g. `$1,234.56` and `-$987.00`.
pub fn format_usd(value: f64) -> String {
	let negative = value < 0.0;
	let cents = (value.abs() * 100.0).round() as u128;
	let dollars = cents / 100;
	let fraction = cents % 100;
	let sign = if negative { "-" } else { "" };

	format!("{sign}${}.{fraction:02}", group_thousands(dollars))
}

pub fn format_count(value: usize) -> String {
	group_thousands(value as u128)
}

fn group_thousands(value: u128) -> String {
	let digits = value.to_string();
	let mut out = String::with_capacity(digits.len() + digits.len() / 3);

	for (index, ch) in digits.chars().enumerate() {
		if index > 0 && (digits.len() - index) % 3 == 0 {
			out.push(',');
		}

		out.push(ch);
	}

	out
}
