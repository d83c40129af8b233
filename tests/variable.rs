#[macro_use]
mod common;

#[cfg(test)]
mod variable {
    tests! {
        define_and_read in variable is OK
        "3"
    }

    tests! {
        uninitialized_is_nil in variable is OK
        "nil"
    }

    tests! {
        redefine_global in variable is OK
        "2"
    }

    tests! {
        shadowing in variable is OK
        "inner"
        "outer"
    }

    tests! {
        undefined in variable is ERR(70)
        "[line 1:7] Error at 'missing': Undefined variable 'missing'"
    }

    tests! {
        own_initializer in variable is ERR(65)
        "[line 2:11] Error at 'a': Cannot read local variable in its own initializer"
    }

    tests! {
        redeclare_local in variable is ERR(65)
        "[line 3:7] Error at 'a': A variable is already defined with name 'a' in this scope"
    }
}
