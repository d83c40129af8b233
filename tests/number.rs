#[macro_use]
mod common;

#[cfg(test)]
mod number {
    tests! {
        literals in number is OK
        "123"
        "2.5"
        "5"
        "2"
    }

    tests! {
        negation in number is OK
        "-7"
        "7"
    }

    tests! {
        trailing_dot in number is ERR(65)
        "[line 1:7] Error: Unterminated number"
    }
}
