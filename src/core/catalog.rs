//! Static currency catalog: display names and the country used for each
//! currency's flag.

use crate::core::currency::RateTable;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Country code used when a currency has no known country.
pub const UNKNOWN_COUNTRY: &str = "xx";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub country: &'static str,
}

/// A currency offered for selection, as derived from a rate table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub code: String,
    pub name: String,
}

// (code, name, ISO 3166 country)
const CURRENCIES: &[(&str, &str, &str)] = &[
    ("AED", "UAE Dirham", "ae"),
    ("AFN", "Afghan Afghani", "af"),
    ("ALL", "Albanian Lek", "al"),
    ("AMD", "Armenian Dram", "am"),
    ("ANG", "Netherlands Antillean Guilder", "cw"),
    ("AOA", "Angolan Kwanza", "ao"),
    ("ARS", "Argentine Peso", "ar"),
    ("AUD", "Australian Dollar", "au"),
    ("AWG", "Aruban Florin", "aw"),
    ("AZN", "Azerbaijani Manat", "az"),
    ("BAM", "Bosnia-Herzegovina Convertible Mark", "ba"),
    ("BBD", "Barbadian Dollar", "bb"),
    ("BDT", "Bangladeshi Taka", "bd"),
    ("BGN", "Bulgarian Lev", "bg"),
    ("BHD", "Bahraini Dinar", "bh"),
    ("BIF", "Burundian Franc", "bi"),
    ("BMD", "Bermudan Dollar", "bm"),
    ("BND", "Brunei Dollar", "bn"),
    ("BOB", "Bolivian Boliviano", "bo"),
    ("BRL", "Brazilian Real", "br"),
    ("BSD", "Bahamian Dollar", "bs"),
    ("BTN", "Bhutanese Ngultrum", "bt"),
    ("BWP", "Botswanan Pula", "bw"),
    ("BYN", "Belarusian Ruble", "by"),
    ("BZD", "Belize Dollar", "bz"),
    ("CAD", "Canadian Dollar", "ca"),
    ("CDF", "Congolese Franc", "cd"),
    ("CHF", "Swiss Franc", "ch"),
    ("CLF", "Chilean Unit of Account", "cl"),
    ("CLP", "Chilean Peso", "cl"),
    ("CNH", "Chinese Yuan (Offshore)", "cn"),
    ("CNY", "Chinese Yuan", "cn"),
    ("COP", "Colombian Peso", "co"),
    ("CRC", "Costa Rican Colón", "cr"),
    ("CUP", "Cuban Peso", "cu"),
    ("CVE", "Cape Verdean Escudo", "cv"),
    ("CZK", "Czech Koruna", "cz"),
    ("DJF", "Djiboutian Franc", "dj"),
    ("DKK", "Danish Krone", "dk"),
    ("DOP", "Dominican Peso", "do"),
    ("DZD", "Algerian Dinar", "dz"),
    ("EGP", "Egyptian Pound", "eg"),
    ("ERN", "Eritrean Nakfa", "er"),
    ("ETB", "Ethiopian Birr", "et"),
    ("EUR", "Euro", "eu"),
    ("FJD", "Fijian Dollar", "fj"),
    ("FKP", "Falkland Islands Pound", "fk"),
    ("FOK", "Faroese Króna", "fo"),
    ("GBP", "British Pound", "gb"),
    ("GEL", "Georgian Lari", "ge"),
    ("GGP", "Guernsey Pound", "gg"),
    ("GHS", "Ghanaian Cedi", "gh"),
    ("GIP", "Gibraltar Pound", "gi"),
    ("GMD", "Gambian Dalasi", "gm"),
    ("GNF", "Guinean Franc", "gn"),
    ("GTQ", "Guatemalan Quetzal", "gt"),
    ("GYD", "Guyanaese Dollar", "gy"),
    ("HKD", "Hong Kong Dollar", "hk"),
    ("HNL", "Honduran Lempira", "hn"),
    ("HRK", "Croatian Kuna", "hr"),
    ("HTG", "Haitian Gourde", "ht"),
    ("HUF", "Hungarian Forint", "hu"),
    ("IDR", "Indonesian Rupiah", "id"),
    ("ILS", "Israeli Shekel", "il"),
    ("INR", "Indian Rupee", "in"),
    ("IQD", "Iraqi Dinar", "iq"),
    ("IRR", "Iranian Rial", "ir"),
    ("ISK", "Icelandic Krona", "is"),
    ("JEP", "Jersey Pound", "je"),
    ("JMD", "Jamaican Dollar", "jm"),
    ("JOD", "Jordanian Dinar", "jo"),
    ("JPY", "Japanese Yen", "jp"),
    ("KES", "Kenyan Shilling", "ke"),
    ("KGS", "Kyrgystani Som", "kg"),
    ("KHR", "Cambodian Riel", "kh"),
    ("KMF", "Comorian Franc", "km"),
    ("KPW", "North Korean Won", "kp"),
    ("KRW", "South Korean Won", "kr"),
    ("KWD", "Kuwaiti Dinar", "kw"),
    ("KYD", "Cayman Islands Dollar", "ky"),
    ("KZT", "Kazakhstani Tenge", "kz"),
    ("LAK", "Laotian Kip", "la"),
    ("LBP", "Lebanese Pound", "lb"),
    ("LKR", "Sri Lankan Rupee", "lk"),
    ("LRD", "Liberian Dollar", "lr"),
    ("LSL", "Lesotho Loti", "ls"),
    ("LYD", "Libyan Dinar", "ly"),
    ("MAD", "Moroccan Dirham", "ma"),
    ("MDL", "Moldovan Leu", "md"),
    ("MGA", "Malagasy Ariary", "mg"),
    ("MKD", "Macedonian Denar", "mk"),
    ("MMK", "Myanma Kyat", "mm"),
    ("MNT", "Mongolian Tugrik", "mn"),
    ("MOP", "Macanese Pataca", "mo"),
    ("MRU", "Mauritanian Ouguiya", "mr"),
    ("MUR", "Mauritian Rupee", "mu"),
    ("MVR", "Maldivian Rufiyaa", "mv"),
    ("MWK", "Malawian Kwacha", "mw"),
    ("MXN", "Mexican Peso", "mx"),
    ("MYR", "Malaysian Ringgit", "my"),
    ("MZN", "Mozambican Metical", "mz"),
    ("NAD", "Namibian Dollar", "na"),
    ("NGN", "Nigerian Naira", "ng"),
    ("NIO", "Nicaraguan Córdoba", "ni"),
    ("NOK", "Norwegian Krone", "no"),
    ("NPR", "Nepalese Rupee", "np"),
    ("NZD", "New Zealand Dollar", "nz"),
    ("OMR", "Omani Rial", "om"),
    ("PAB", "Panamanian Balboa", "pa"),
    ("PEN", "Peruvian Sol", "pe"),
    ("PGK", "Papua New Guinean Kina", "pg"),
    ("PHP", "Philippine Peso", "ph"),
    ("PKR", "Pakistani Rupee", "pk"),
    ("PLN", "Polish Zloty", "pl"),
    ("PYG", "Paraguayan Guarani", "py"),
    ("QAR", "Qatari Riyal", "qa"),
    ("RON", "Romanian Leu", "ro"),
    ("RSD", "Serbian Dinar", "rs"),
    ("RUB", "Russian Ruble", "ru"),
    ("RWF", "Rwandan Franc", "rw"),
    ("SAR", "Saudi Riyal", "sa"),
    ("SBD", "Solomon Islands Dollar", "sb"),
    ("SCR", "Seychellois Rupee", "sc"),
    ("SDG", "Sudanese Pound", "sd"),
    ("SEK", "Swedish Krona", "se"),
    ("SGD", "Singapore Dollar", "sg"),
    ("SHP", "Saint Helena Pound", "sh"),
    ("SLE", "Sierra Leonean Leone", "sl"),
    ("SOS", "Somali Shilling", "so"),
    ("SRD", "Surinamese Dollar", "sr"),
    ("SSP", "South Sudanese Pound", "ss"),
    ("STN", "São Tomé and Príncipe Dobra", "st"),
    ("SVC", "Salvadoran Colón", "sv"),
    ("SYP", "Syrian Pound", "sy"),
    ("SZL", "Swazi Lilangeni", "sz"),
    ("THB", "Thai Baht", "th"),
    ("TJS", "Tajikistani Somoni", "tj"),
    ("TMT", "Turkmenistani Manat", "tm"),
    ("TND", "Tunisian Dinar", "tn"),
    ("TOP", "Tongan Paʻanga", "to"),
    ("TRY", "Turkish Lira", "tr"),
    ("TTD", "Trinidad and Tobago Dollar", "tt"),
    ("TWD", "Taiwan Dollar", "tw"),
    ("TZS", "Tanzanian Shilling", "tz"),
    ("UAH", "Ukrainian Hryvnia", "ua"),
    ("UGX", "Ugandan Shilling", "ug"),
    ("USD", "US Dollar", "us"),
    ("UYU", "Uruguayan Peso", "uy"),
    ("UZS", "Uzbekistan Som", "uz"),
    ("VES", "Venezuelan Bolívar", "ve"),
    ("VND", "Vietnamese Dong", "vn"),
    ("VUV", "Vanuatu Vatu", "vu"),
    ("WST", "Samoan Tala", "ws"),
    ("XAF", "CFA Franc BEAC", "cm"),
    ("XCD", "East Caribbean Dollar", "ag"),
    ("XDR", "Special Drawing Rights", "im"),
    ("XOF", "CFA Franc BCEAO", "sn"),
    ("XPF", "CFP Franc", "pf"),
    ("YER", "Yemeni Rial", "ye"),
    ("ZAR", "South African Rand", "za"),
    ("ZMW", "Zambian Kwacha", "zm"),
    ("ZWL", "Zimbabwean Dollar", "zw"),
];

static CATALOG: LazyLock<HashMap<&'static str, CurrencyInfo>> = LazyLock::new(|| {
    CURRENCIES
        .iter()
        .map(|&(code, name, country)| {
            (
                code,
                CurrencyInfo {
                    code,
                    name,
                    country,
                },
            )
        })
        .collect()
});

pub fn lookup(code: &str) -> Option<&'static CurrencyInfo> {
    CATALOG.get(code)
}

/// Display name for a currency, falling back to the code itself.
pub fn currency_name(code: &str) -> &str {
    lookup(code).map_or(code, |info| info.name)
}

/// Lowercase country code for a currency's flag.
pub fn country_code(code: &str) -> &'static str {
    lookup(code).map_or(UNKNOWN_COUNTRY, |info| info.country)
}

/// Currencies available in a rate table, sorted by code.
pub fn currency_list(table: &RateTable) -> Vec<Currency> {
    let mut currencies: Vec<Currency> = table
        .codes()
        .map(|code| Currency {
            code: code.to_string(),
            name: currency_name(code).to_string(),
        })
        .collect();
    currencies.sort_by(|a, b| a.code.cmp(&b.code));
    currencies
}

/// Case-insensitive match on code or name.
pub fn search<'a>(currencies: &'a [Currency], term: &str) -> Vec<&'a Currency> {
    let term = term.to_lowercase();
    currencies
        .iter()
        .filter(|c| c.code.to_lowercase().contains(&term) || c.name.to_lowercase().contains(&term))
        .collect()
}
