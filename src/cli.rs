// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, arg, crate_version};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(arg!(--json "Print as a JSON array").action(ArgAction::SetTrue))
        .arg(arg!(--jsonl "Print as JSON lines").action(ArgAction::SetTrue))
}

pub fn build_cli() -> Command {
    Command::new("tallybook")
        .version(crate_version!())
        .about("Personal finance ledger: accounts, assets, credit cards, recurring payments")
        .arg(
            Arg::new("owner")
                .long("owner")
                .value_name("NAME")
                .global(true)
                .help("Caller identity; defaults to the configured default owner"),
        )
        .subcommand(
            Command::new("init").about("Initialize the database and set the default owner"),
        )
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--type <TYPE> "CASH, BANK, CREDIT_CARD, LOAN or OTHER").required(true))
                        .arg(arg!(--hidden "Exclude from default balances").action(ArgAction::SetTrue))
                        .arg(arg!(--opening <AMOUNT> "Opening balance"))
                        .arg(arg!(--date <DATE> "Opening balance date"))
                        .arg(arg!(--"close-day" <DAY> "Statement close day of month"))
                        .arg(arg!(--"month-end" "Close statements at month end").action(ArgAction::SetTrue))
                        .arg(arg!(--"due-day" <DAY> "Payment due day of month"))
                        .arg(arg!(--"due-days" <DAYS> "Payment due days after close"))
                        .arg(arg!(--"min-pct" <PCT> "Minimum payment percentage"))
                        .arg(arg!(--limit <AMOUNT> "Credit limit"))
                        .arg(arg!(--apr <PCT> "Annual percentage rate")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(arg!(--"as-of" <DATE> "Balance cutoff date"))
                        .arg(arg!(--all "Include hidden accounts").action(ArgAction::SetTrue)),
                ))
                .subcommand(
                    Command::new("set")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--rename <NAME>))
                        .arg(arg!(--hidden <BOOL>))
                        .arg(arg!(--"close-day" <DAY>))
                        .arg(arg!(--"month-end" "Close statements at month end").action(ArgAction::SetTrue))
                        .arg(arg!(--"due-day" <DAY>))
                        .arg(arg!(--"due-days" <DAYS>))
                        .arg(arg!(--"min-pct" <PCT>))
                        .arg(arg!(--limit <AMOUNT>))
                        .arg(arg!(--apr <PCT>)),
                )
                .subcommand(Command::new("rm").arg(arg!(--id <ID>).required(true)))
                .subcommand(
                    Command::new("bulk-rm")
                        .arg(arg!(--ids <IDS> "Comma-separated account ids").required(true)),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(Command::new("add").arg(arg!(--name <NAME>).required(true)))
                .subcommand(Command::new("list"))
                .subcommand(Command::new("rm").arg(arg!(--name <NAME>).required(true))),
        )
        .subcommand(
            Command::new("tx")
                .about("Manage ledger transactions")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--account <ACCOUNT>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--category <CATEGORY>)),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(arg!(--account <ACCOUNT>))
                        .arg(arg!(--category <CATEGORY>))
                        .arg(arg!(--from <DATE>))
                        .arg(arg!(--to <DATE>))
                        .arg(arg!(--limit <N>).value_parser(clap::value_parser!(usize))),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--amount <AMOUNT>))
                        .arg(arg!(--date <DATE>))
                        .arg(arg!(--account <ACCOUNT>))
                        .arg(arg!(--category <CATEGORY>))
                        .arg(arg!(--"clear-category" "Remove the category").action(ArgAction::SetTrue)),
                )
                .subcommand(Command::new("rm").arg(arg!(--id <ID>).required(true)))
                .subcommand(
                    Command::new("bulk-rm")
                        .arg(arg!(--ids <IDS> "Comma-separated transaction ids").required(true)),
                ),
        )
        .subcommand(
            Command::new("transfer")
                .about("Manage transfers between accounts")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--date <DATE>).required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--charge <AMOUNT> "Transfer fee"))
                        .arg(arg!(--from <ACCOUNT>))
                        .arg(arg!(--to <ACCOUNT>))
                        .arg(arg!(--notes <NOTES>))
                        .arg(arg!(--statement <ID> "Statement being paid")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(arg!(--account <ACCOUNT>)),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--amount <AMOUNT>))
                        .arg(arg!(--charge <AMOUNT>))
                        .arg(arg!(--date <DATE>))
                        .arg(arg!(--notes <NOTES>))
                        .arg(arg!(--from <ACCOUNT>))
                        .arg(arg!(--"clear-from" "Drop the from side").action(ArgAction::SetTrue))
                        .arg(arg!(--to <ACCOUNT>))
                        .arg(arg!(--"clear-to" "Drop the to side").action(ArgAction::SetTrue)),
                )
                .subcommand(Command::new("rm").arg(arg!(--id <ID>).required(true)))
                .subcommand(
                    Command::new("bulk-rm")
                        .arg(arg!(--ids <IDS> "Comma-separated transfer ids").required(true)),
                ),
        )
        .subcommand(
            Command::new("asset")
                .about("Manage asset holdings and lots")
                .subcommand(
                    Command::new("buy")
                        .arg(arg!(--name <NAME>).required(true))
                        .arg(arg!(--type <TYPE>).required(true))
                        .arg(arg!(--unit <UNIT>).required(true))
                        .arg(arg!(--quantity <QTY>).required(true).value_parser(clap::value_parser!(i64)))
                        .arg(arg!(--price <AMOUNT> "Cost per unit").required(true))
                        .arg(arg!(--extra <AMOUNT> "Extra charge"))
                        .arg(arg!(--account <ACCOUNT>).required(true))
                        .arg(arg!(--date <DATE>).required(true)),
                )
                .subcommand(
                    Command::new("sell")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--quantity <QTY>).required(true).value_parser(clap::value_parser!(i64)))
                        .arg(arg!(--amount <AMOUNT> "Total sale amount").required(true))
                        .arg(arg!(--extra <AMOUNT> "Sale extra charge"))
                        .arg(arg!(--date <DATE>).required(true)),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(arg!(--all "Include sold-out assets").action(ArgAction::SetTrue)),
                ))
                .subcommand(json_flags(
                    Command::new("lots").arg(arg!(--id <ID>).required(true)),
                ))
                .subcommand(
                    Command::new("edit-lot")
                        .arg(arg!(--lot <ID>).required(true))
                        .arg(arg!(--quantity <QTY>).value_parser(clap::value_parser!(i64)))
                        .arg(arg!(--price <AMOUNT>))
                        .arg(arg!(--extra <AMOUNT>))
                        .arg(arg!(--date <DATE>)),
                )
                .subcommand(Command::new("rm-lot").arg(arg!(--lot <ID>).required(true))),
        )
        .subcommand(
            Command::new("card")
                .about("Credit-card statements and billing cycles")
                .subcommand(json_flags(
                    Command::new("summary").arg(arg!(--date <DATE>)),
                ))
                .subcommand(json_flags(
                    Command::new("preview")
                        .arg(arg!(--account <ACCOUNT>).required(true))
                        .arg(arg!(--date <DATE>)),
                ))
                .subcommand(
                    Command::new("close")
                        .arg(arg!(--account <ACCOUNT>).required(true))
                        .arg(arg!(--date <DATE>))
                        .arg(arg!(--due <AMOUNT> "Override the amount due")),
                )
                .subcommand(json_flags(
                    Command::new("statements")
                        .arg(arg!(--account <ACCOUNT>))
                        .arg(arg!(--paid "Only paid statements").action(ArgAction::SetTrue))
                        .arg(arg!(--unpaid "Only unpaid statements").action(ArgAction::SetTrue)),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--due <AMOUNT>).required(true)),
                )
                .subcommand(json_flags(Command::new("next").arg(arg!(--date <DATE>)))),
        )
        .subcommand(
            Command::new("recur")
                .about("Recurring scheduled payments")
                .subcommand(
                    Command::new("add")
                        .arg(arg!(--kind <KIND> "TRANSACTION or TRANSFER").required(true))
                        .arg(arg!(--cadence <CADENCE> "DAILY, MONTHLY or YEARLY").required(true))
                        .arg(arg!(--amount <AMOUNT>).required(true))
                        .arg(arg!(--start <DATE>).required(true))
                        .arg(arg!(--account <ACCOUNT>))
                        .arg(arg!(--to <ACCOUNT>))
                        .arg(arg!(--category <CATEGORY>))
                        .arg(arg!(--day <DAY> "Day of month"))
                        .arg(arg!(--month <MONTH> "Month for yearly cadence")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(arg!(--all "Include inactive items").action(ArgAction::SetTrue))
                        .arg(arg!(--date <DATE>)),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--amount <AMOUNT>))
                        .arg(arg!(--cadence <CADENCE>))
                        .arg(arg!(--day <DAY>))
                        .arg(arg!(--month <MONTH>))
                        .arg(arg!(--active <BOOL>)),
                )
                .subcommand(
                    Command::new("complete")
                        .arg(arg!(--id <ID>).required(true))
                        .arg(arg!(--date <DATE>)),
                )
                .subcommand(Command::new("rm").arg(arg!(--id <ID>).required(true))),
        )
        .subcommand(
            Command::new("price")
                .about("Asset price feed")
                .subcommand(
                    Command::new("set")
                        .arg(arg!(--type <TYPE>).required(true))
                        .arg(arg!(--price <AMOUNT> "Price per unit").required(true)),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
}
