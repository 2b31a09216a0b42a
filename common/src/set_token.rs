use alloy::sol;

sol! {
    /// Subset of the Set Protocol v2 `SetToken` interface.
    #[sol(rpc)]
    interface ISetToken {
        struct Position {
            address component;
            address module;
            int256 unit;
            uint8 positionState;
            bytes data;
        }

        function getPositions() external view returns (Position[] memory);
    }
}

